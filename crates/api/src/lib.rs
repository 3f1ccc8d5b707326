mod job_schedulers;
mod reminder;
mod shared;

use eppets_scheduler_infra::EppetsContext;
use job_schedulers::start_send_reminders_job;
use tokio::task::JoinHandle;

pub struct Application {
    context: EppetsContext,
}

impl Application {
    pub fn new(context: EppetsContext) -> Self {
        Self { context }
    }

    fn start_job_schedulers(context: EppetsContext) -> JoinHandle<()> {
        start_send_reminders_job(context)
    }

    /// Runs the job schedulers until the process is stopped
    pub async fn start(self) -> Result<(), std::io::Error> {
        Application::start_job_schedulers(self.context)
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}
