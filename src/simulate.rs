//! Demo traffic: feeds a handful of canned posts through the fast path at a
//! fixed cadence. Only one simulation runs at a time; the supervisor guard is
//! released when the task ends, however it ends.

use std::time::Duration;

use chrono::Utc;
use rand::seq::IndexedRandom;
use tracing::{info, warn};

use crate::db;
use crate::processor;
use crate::state::AppContext;
use crate::supervisor::SimulationGuard;

/// (text, source) pairs for simulated ingestion.
const SAMPLE_POSTS: &[(&str, &str)] = &[
    ("Just bought the new iPhone 15! Camera quality is insane 📸", "Twitter"),
    ("Tesla's autopilot almost crashed my car today. This is unacceptable!", "Twitter"),
    ("Amazing customer service from Apple Store! They replaced my device immediately.", "Twitter"),
    ("Terrible experience with Tesla service center. Waited 3 hours for nothing.", "Reddit"),
    ("The new MacBook Pro is a game changer for developers!", "Twitter"),
    ("Tesla battery is draining way too fast. Very disappointed.", "Twitter"),
    ("Apple's new iOS update fixed all my issues. Love it!", "Reddit"),
    ("Tesla charging network is the best thing about owning this car.", "Twitter"),
    ("My iPhone keeps freezing. Worst phone I've ever had.", "Twitter"),
    ("Tesla Model 3 is the most fun car I've ever driven!", "Reddit"),
    ("Apple Watch saved my life by detecting irregular heartbeat!", "Twitter"),
    ("Tesla software update broke my car's infotainment system.", "Twitter"),
    ("The Apple ecosystem just works. Everything syncs perfectly.", "Reddit"),
    ("Tesla quality control is terrible. Panel gaps everywhere.", "Twitter"),
    ("AirPods Pro are worth every penny. Best noise cancellation!", "Twitter"),
    ("Got stuck in a Tesla with dead battery. Support was useless.", "Reddit"),
    ("iPhone battery lasts all day with heavy use. Impressed!", "Twitter"),
    ("Tesla paint is chipping after just 6 months. Unbelievable.", "Twitter"),
    ("Apple TV+ has some amazing shows. Highly recommend!", "Reddit"),
    ("Tesla autopilot is revolutionary. Can't imagine driving without it.", "Twitter"),
];

pub async fn run_simulation(
    ctx: AppContext,
    count: u32,
    interval: Duration,
    guard: SimulationGuard,
) {
    // held for the lifetime of the task
    let _guard = guard;
    info!(count, interval_secs = interval.as_secs(), "simulation started");

    for _ in 0..count {
        let (text, source) = {
            let mut rng = rand::rng();
            *SAMPLE_POSTS.choose(&mut rng).expect("sample posts")
        };

        match db::create_post(&ctx.db, text, Utc::now(), source).await {
            Ok(post_id) => {
                processor::process_and_notify(&ctx, post_id).await;
            }
            Err(e) => warn!(error = %e, "failed to create simulated post"),
        }

        tokio::time::sleep(interval).await;
    }

    info!("simulation finished");
}
