use async_trait::async_trait;

/// Where results and prompts are shown to the user.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Show a message without waiting for the user.
    async fn notice(&self, message: &str);

    /// Ask a yes/no question; `false` when nobody answers.
    async fn confirm(&self, message: &str) -> bool;
}

/// Prints to stdout; confirmations get a fixed answer.
pub struct ConsoleNotifier {
    answer: bool,
}

impl ConsoleNotifier {
    pub fn new(answer: bool) -> Self {
        Self { answer }
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notice(&self, message: &str) {
        println!("{}", message);
    }

    async fn confirm(&self, message: &str) -> bool {
        println!("{}", message);
        log::info!("Answering {:?} to the prompt", if self.answer { "yes" } else { "no" });
        self.answer
    }
}
