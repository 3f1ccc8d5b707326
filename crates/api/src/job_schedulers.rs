use crate::{reminder::send_due_reminders::SendDueRemindersUseCase, shared::usecase::execute};
use eppets_scheduler_infra::EppetsContext;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep_until, Instant};

/// Seconds until the next minute boundary, shifted backwards by
/// `secs_before_min`
pub fn get_start_delay(now_ts: usize, secs_before_min: usize) -> usize {
    let secs_to_next_minute = 60 - (now_ts / 1000) % 60;
    if secs_to_next_minute > secs_before_min {
        secs_to_next_minute - secs_before_min
    } else {
        secs_to_next_minute + (60 - secs_before_min)
    }
}

/// Spawns the job that processes due reminders once every minute, aligned
/// to minute boundaries
pub fn start_send_reminders_job(ctx: EppetsContext) -> JoinHandle<()> {
    tokio::spawn(async move {
        let now = ctx.sys.get_timestamp_millis();
        let secs_to_next_run = get_start_delay(now as usize, 0);
        let start = Instant::now() + Duration::from_secs(secs_to_next_run as u64);

        sleep_until(start).await;
        let mut minutely_interval = interval(Duration::from_secs(60));
        loop {
            minutely_interval.tick().await;
            let context = ctx.clone();
            tokio::spawn(send_reminders(context));
        }
    })
}

async fn send_reminders(context: EppetsContext) {
    let usecase = SendDueRemindersUseCase {};
    let _ = execute(usecase, &context).await;
}
