//! Paths of the WordPress stack inside the sandbox

/// Remote filesystem layout of one provisioned stack.
///
/// Paths are POSIX paths inside the sandbox, not on the local host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackLayout {
    /// Working directory the archive is unpacked into
    pub work_dir: String,

    /// Directory name the archive unpacks to
    pub app_dir_name: String,

    /// User nginx and php-fpm workers run as
    pub web_user: String,

    /// php-fpm unix socket
    pub fpm_socket: String,

    /// Port nginx listens on
    pub port: u16,
}

impl StackLayout {
    pub fn app_root(&self) -> String {
        format!("{}/{}", self.work_dir, self.app_dir_name)
    }

    pub fn wp_config(&self) -> String {
        format!("{}/wp-config.php", self.app_root())
    }

    /// Directory for generated files, owned by the sandbox user
    pub fn staging_dir(&self) -> String {
        format!("{}/.pressbox", self.work_dir)
    }

    pub fn staged_wp_config(&self) -> String {
        format!("{}/wp-config.php", self.staging_dir())
    }

    pub fn nginx_conf(&self) -> String {
        format!("{}/nginx.conf", self.staging_dir())
    }

    pub fn fpm_conf(&self) -> String {
        format!("{}/php-fpm.conf", self.staging_dir())
    }

    pub fn log_dir(&self) -> String {
        format!("{}/logs", self.staging_dir())
    }

    pub fn nginx_pid(&self) -> String {
        format!("{}/nginx.pid", self.staging_dir())
    }

    pub fn fpm_pid(&self) -> String {
        format!("{}/php-fpm.pid", self.staging_dir())
    }

    /// Directory holding the php-fpm socket
    pub fn socket_dir(&self) -> String {
        match self.fpm_socket.rsplit_once('/') {
            Some((dir, _)) if !dir.is_empty() => dir.to_string(),
            _ => "/".to_string(),
        }
    }

    /// Every proper ancestor of the working directory, outermost first
    pub fn work_dir_ancestors(&self) -> Vec<String> {
        let mut ancestors = Vec::new();
        let mut current = self.work_dir.trim_end_matches('/');
        while let Some((parent, _)) = current.rsplit_once('/') {
            if parent.is_empty() {
                break;
            }
            ancestors.push(parent.to_string());
            current = parent;
        }
        ancestors.reverse();
        ancestors
    }
}
