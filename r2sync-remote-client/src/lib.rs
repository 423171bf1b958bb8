use std::time::Duration;

use log::{debug, warn};

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
pub const HEAD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStatus {
    Present,
    Missing,
    /// Neither present nor a clean 404. Counted as present so nothing is overwritten.
    Unknown,
}

impl RemoteStatus {
    pub fn exists(&self) -> bool {
        match self {
            RemoteStatus::Present | RemoteStatus::Unknown => true,
            RemoteStatus::Missing => false,
        }
    }

    pub fn from_status_code(code: u16) -> Self {
        match code {
            200 => RemoteStatus::Present,
            404 => RemoteStatus::Missing,
            201..=299 => RemoteStatus::Missing,
            // redirects that were not followed land here too
            _ => RemoteStatus::Unknown,
        }
    }
}

pub trait RemoteIndex {
    fn head(&self, key: &str) -> RemoteStatus;
}

#[derive(Debug, Clone)]
pub struct PublicBucketClient {
    pub base_url: String,
    agent: ureq::Agent,
}

impl PublicBucketClient {
    pub fn new(base_url: String) -> Self {
        Self::with_timeout(base_url, HEAD_TIMEOUT)
    }

    pub fn with_timeout(base_url: String, timeout: Duration) -> Self {
        let mut base_url = base_url;
        while base_url.ends_with('/') {
            base_url.pop();
        }
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self { base_url, agent }
    }

    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

impl RemoteIndex for PublicBucketClient {
    fn head(&self, key: &str) -> RemoteStatus {
        let url = self.object_url(key);
        let code = match self.agent.head(&url).call() {
            Ok(res) => res.status(),
            Err(ureq::Error::Status(code, _)) => code,
            Err(ureq::Error::Transport(e)) => {
                warn!("HEAD {} failed: {}, assuming it exists", url, e);
                return RemoteStatus::Unknown;
            }
        };
        let status = RemoteStatus::from_status_code(code);
        if status == RemoteStatus::Unknown {
            warn!("HEAD {} returned {}, assuming it exists", url, code);
        }
        debug!("HEAD {} -> {:?}", url, status);
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_code() {
        assert_eq!(RemoteStatus::from_status_code(200), RemoteStatus::Present);
        assert_eq!(RemoteStatus::from_status_code(404), RemoteStatus::Missing);
        assert_eq!(RemoteStatus::from_status_code(204), RemoteStatus::Missing);
        assert_eq!(RemoteStatus::from_status_code(300), RemoteStatus::Unknown);
        assert_eq!(RemoteStatus::from_status_code(304), RemoteStatus::Unknown);
        assert_eq!(RemoteStatus::from_status_code(308), RemoteStatus::Unknown);
        assert_eq!(RemoteStatus::from_status_code(403), RemoteStatus::Unknown);
        assert_eq!(RemoteStatus::from_status_code(500), RemoteStatus::Unknown);
    }

    #[test]
    fn test_exists() {
        assert!(RemoteStatus::Present.exists());
        assert!(RemoteStatus::Unknown.exists());
        assert!(!RemoteStatus::Missing.exists());
    }

    #[test]
    fn test_object_url() {
        let client = PublicBucketClient::new("https://media.example.com//".to_string());
        assert_eq!(client.base_url, "https://media.example.com");
        assert_eq!(
            client.object_url("media/rings/a.jpg"),
            "https://media.example.com/media/rings/a.jpg"
        );
    }

    #[test]
    fn test_unreachable_host_is_unknown() {
        let client = PublicBucketClient::with_timeout(
            "http://127.0.0.1:1".to_string(),
            Duration::from_secs(2),
        );
        assert_eq!(client.head("a.jpg"), RemoteStatus::Unknown);
    }
}
