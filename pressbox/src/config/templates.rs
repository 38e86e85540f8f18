//! wp-config.php, nginx and php-fpm templates

use secrecy::ExposeSecret;

use crate::config::database::ConnectionDescriptor;
use crate::config::escape::escape_php_single_quoted;
use crate::config::layout::StackLayout;
use crate::config::secrets::SecurityKeys;

/// WordPress options rendered into wp-config.php
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPressOptions {
    pub table_prefix: String,
    pub debug: bool,
}

impl Default for WordPressOptions {
    fn default() -> Self {
        Self {
            table_prefix: "wp_".to_string(),
            debug: true,
        }
    }
}

/// Render wp-config.php.
///
/// Site URLs follow the request host over https, and the
/// `X-Forwarded-Proto` header from the sandbox proxy switches `HTTPS` on.
pub fn render_wp_config(
    db: &ConnectionDescriptor,
    keys: &SecurityKeys,
    options: &WordPressOptions,
) -> String {
    let keys_block: String = keys
        .iter()
        .map(|(name, value)| format!("define( '{}', '{}' );\n", name, value))
        .collect();

    format!(
        r#"<?php
define( 'DB_NAME', '{name}' );
define( 'DB_USER', '{user}' );
define( 'DB_PASSWORD', '{password}' );
define( 'DB_HOST', '{host}' );
define( 'DB_CHARSET', 'utf8mb4' );
define( 'DB_COLLATE', '' );

{keys_block}
if ( isset( $_SERVER['HTTP_X_FORWARDED_PROTO'] ) && $_SERVER['HTTP_X_FORWARDED_PROTO'] === 'https' ) {{
    $_SERVER['HTTPS'] = 'on';
}}

if ( isset( $_SERVER['HTTP_HOST'] ) ) {{
    define( 'WP_HOME', 'https://' . $_SERVER['HTTP_HOST'] );
    define( 'WP_SITEURL', 'https://' . $_SERVER['HTTP_HOST'] );
}}

$table_prefix = '{prefix}';

define( 'WP_DEBUG', {debug} );

if ( ! defined( 'ABSPATH' ) ) {{
    define( 'ABSPATH', __DIR__ . '/' );
}}

require_once ABSPATH . 'wp-settings.php';
"#,
        name = escape_php_single_quoted(&db.name),
        user = escape_php_single_quoted(&db.user),
        password = escape_php_single_quoted(db.password.expose_secret()),
        host = escape_php_single_quoted(&db.host_with_port()),
        keys_block = keys_block,
        prefix = escape_php_single_quoted(&options.table_prefix),
        debug = if options.debug { "true" } else { "false" },
    )
}

/// Render a standalone nginx.conf serving the app root on the layout's port
pub fn render_nginx_conf(layout: &StackLayout) -> String {
    format!(
        r#"user {user};
worker_processes auto;
pid {pid};
error_log {logs}/nginx-error.log;

events {{
    worker_connections 1024;
}}

http {{
    include /etc/nginx/mime.types;
    default_type application/octet-stream;
    access_log {logs}/nginx-access.log;
    sendfile on;
    client_max_body_size 64m;

    server {{
        listen {port};
        server_name _;
        root {root};
        index index.php index.html;

        location / {{
            try_files $uri $uri/ /index.php?$args;
        }}

        location ~ \.php$ {{
            try_files $uri =404;
            include /etc/nginx/fastcgi_params;
            fastcgi_param SCRIPT_FILENAME $document_root$fastcgi_script_name;
            fastcgi_pass unix:{socket};
        }}

        location ~* \.(css|js|png|jpe?g|gif|ico|svg|webp|woff2?)$ {{
            try_files $uri =404;
            expires 7d;
            access_log off;
        }}
    }}
}}
"#,
        user = layout.web_user,
        pid = layout.nginx_pid(),
        logs = layout.log_dir(),
        port = layout.port,
        root = layout.app_root(),
        socket = layout.fpm_socket,
    )
}

/// Render php-fpm.conf with a single pool listening on the layout's socket
pub fn render_fpm_conf(layout: &StackLayout) -> String {
    format!(
        r#"[global]
pid = {pid}
error_log = {logs}/php-fpm.log
daemonize = no

[pressbox]
user = {user}
group = {user}
listen = {socket}
listen.owner = {user}
listen.group = {user}
listen.mode = 0660
pm = dynamic
pm.max_children = 8
pm.start_servers = 2
pm.min_spare_servers = 1
pm.max_spare_servers = 4
clear_env = no
catch_workers_output = yes
"#,
        pid = layout.fpm_pid(),
        logs = layout.log_dir(),
        user = layout.web_user,
        socket = layout.fpm_socket,
    )
}
