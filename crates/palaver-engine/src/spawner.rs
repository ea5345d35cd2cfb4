//! Spawns the automated participants and their shared provider.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use palaver_participant::{
    ParticipantConfig, ParticipantController, ParticipantError, StopReason,
};
use palaver_post::PostOffice;
use palaver_types::Address;

/// The join handle of one running participant task.
pub type ParticipantHandle = JoinHandle<Result<StopReason, ParticipantError>>;

/// Spawn `count` automated participants against the given room and
/// provider, each with its own random stream.
pub async fn spawn_automated(
    post: &PostOffice,
    room: &Address,
    provider: &Address,
    count: usize,
    shutdown: &watch::Receiver<bool>,
) -> Vec<ParticipantHandle> {
    let mut handles = Vec::with_capacity(count);
    for n in 1..=count {
        let address = Address::new(format!("participant-{n}"));
        let config = ParticipantConfig::new(room.clone(), provider.clone());
        let controller =
            ParticipantController::register(post, address, config, SmallRng::from_os_rng())
                .await;
        handles.push(tokio::spawn(controller.run(shutdown.clone())));
    }
    handles
}
