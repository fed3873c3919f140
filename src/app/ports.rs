use async_trait::async_trait;

/// Outcome of probing a repository URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    Reachable,
    Unreachable(String),
}

/// Reachability probing, injected into the validator so tests can swap in a
/// deterministic fake that never touches the network.
#[async_trait]
pub trait LinkChecker: Send + Sync {
    async fn check(&self, url: &str) -> LinkStatus;
}
