/// Domain interface for bringing the configured work application to
/// the foreground.
///
/// The OS mechanism (process launch, window activation) lives behind
/// this trait; failures are logged by the dispatcher and never retried
/// automatically.
pub trait AppSwitcher: Send + Sync {
    fn bring_to_front(&self) -> Result<(), Box<dyn std::error::Error>>;
}
