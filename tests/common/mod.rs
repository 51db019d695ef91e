#![allow(dead_code)]

pub mod collaborators {
    use gatehouse::config::ConfigStore;
    use gatehouse::error::OriginCheckError;
    use gatehouse::origin::OriginChecker;
    use gatehouse::request::AdminRequest;
    use gatehouse::session::SessionStore;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Permits a fixed set of addresses and records every address it was asked about
    #[derive(Default)]
    pub struct StaticOrigins {
        permitted: Vec<String>,
        pub seen: Mutex<Vec<String>>,
    }

    impl StaticOrigins {
        pub fn permitting(ips: &[&str]) -> Self {
            Self {
                permitted: ips.iter().map(|s| s.to_string()).collect(),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl OriginChecker for StaticOrigins {
        fn permitted_source(&self, ip: &str) -> Result<bool, OriginCheckError> {
            self.seen.lock().unwrap().push(ip.to_string());
            Ok(self.permitted.iter().any(|p| p == ip))
        }
    }

    /// Every check fails
    pub struct FailingOrigins;

    impl OriginChecker for FailingOrigins {
        fn permitted_source(&self, _ip: &str) -> Result<bool, OriginCheckError> {
            Err(OriginCheckError::Backend("permit list unavailable".to_string()))
        }
    }

    /// Fixed session validity and nonce, counting validity checks
    pub struct StaticSession {
        valid: bool,
        nonce: String,
        pub checks: AtomicUsize,
    }

    impl StaticSession {
        pub fn valid() -> Self {
            Self::new(true)
        }

        pub fn invalid() -> Self {
            Self::new(false)
        }

        fn new(valid: bool) -> Self {
            Self {
                valid,
                nonce: "test-nonce".to_string(),
                checks: AtomicUsize::new(0),
            }
        }

        pub fn checks(&self) -> usize {
            self.checks.load(Ordering::SeqCst)
        }
    }

    impl SessionStore for StaticSession {
        fn valid_session(&self, _request: &AdminRequest) -> bool {
            self.checks.fetch_add(1, Ordering::SeqCst);
            self.valid
        }

        fn nonce(&self) -> String {
            self.nonce.clone()
        }
    }

    /// In-memory configuration keyed by dotted names
    #[derive(Default)]
    pub struct MapConfig {
        values: HashMap<String, String>,
    }

    impl MapConfig {
        pub fn with(mut self, key: &str, value: &str) -> Self {
            self.values.insert(key.to_string(), value.to_string());
            self
        }
    }

    impl ConfigStore for MapConfig {
        fn get_str(&self, key: &str) -> Option<String> {
            self.values.get(key).cloned()
        }

        fn get_bool(&self, key: &str) -> Option<bool> {
            self.values.get(key).and_then(|v| v.parse().ok())
        }
    }
}

pub mod templates {
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Template root containing `files` (`(relative path, content)` pairs)
    pub fn template_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            write_template(dir.path(), rel, content);
        }
        dir
    }

    pub fn write_template(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

pub mod requests {
    use gatehouse::request::AdminRequest;
    use http::Method;
    use std::net::IpAddr;

    pub const LOCAL: &str = "127.0.0.1";

    pub fn get(path: &str) -> AdminRequest {
        from(path, LOCAL)
    }

    pub fn from(path: &str, ip: &str) -> AdminRequest {
        let ip: IpAddr = ip.parse().unwrap();
        AdminRequest::new(Method::GET, path, ip)
    }
}
