//! Lazy, backpressured sequences of generations computed on a background worker.
use crate::{LifeAlgorithm, SparseCellSet};
use anyhow::{anyhow, Context, Result};
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

type Producer = JoinHandle<Result<Box<dyn LifeAlgorithm>>>;

/// Infinite sequence of states, each `step` generations after the previous one.
///
/// The engine runs on a dedicated tokio runtime with one worker thread and
/// one blocking thread, and hands states over through a channel of capacity one: a new generation is started
/// only after the consumer has taken the previous one, so the worker is never
/// more than one generation ahead.
///
/// Dropping the stream cancels it: a generation already being computed runs
/// to completion in the background, but no further generation is started.
///
/// Iterating blocks the calling thread and must not happen inside an async context.
pub struct GenerationStream {
    receiver: mpsc::Receiver<SparseCellSet>,
    producer: Option<Producer>,
    runtime: Option<Runtime>,
}

impl GenerationStream {
    /// Starts producing generations of `initial` with `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker runtime cannot be built.
    pub fn spawn(
        algorithm: Box<dyn LifeAlgorithm>,
        initial: SparseCellSet,
        step: u64,
    ) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(1)
            .thread_name("gol-hashlife-worker")
            .build()
            .context("Failed to start the generation worker")?;
        let (sender, receiver) = mpsc::channel(1);
        let producer = runtime.spawn(async move {
            let result = produce(algorithm, initial, step, sender).await;
            if let Err(err) = &result {
                error!("generation worker failed: {err:#}");
            }
            result
        });
        Ok(Self {
            receiver,
            producer: Some(producer),
            runtime: Some(runtime),
        })
    }

    /// Stops production and returns the engine, together with its warm caches.
    ///
    /// Waits for the generation in flight, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine panicked on the worker.
    pub fn into_algorithm(mut self) -> Result<Box<dyn LifeAlgorithm>> {
        self.receiver.close();
        let (Some(runtime), Some(producer)) = (self.runtime.take(), self.producer.take()) else {
            return Err(anyhow!("Generation worker is already shut down"));
        };
        runtime
            .block_on(producer)
            .context("Generation worker was aborted")?
    }
}

async fn produce(
    mut algorithm: Box<dyn LifeAlgorithm>,
    initial: SparseCellSet,
    step: u64,
    sender: mpsc::Sender<SparseCellSet>,
) -> Result<Box<dyn LifeAlgorithm>> {
    algorithm = tokio::task::spawn_blocking(move || {
        algorithm.load_cells(&initial);
        algorithm
    })
    .await?;
    info!(algorithm = algorithm.name(), step, "generation stream started");

    let mut produced = 0u64;
    // a permit is granted only once the consumer has emptied the channel
    while let Ok(permit) = sender.reserve().await {
        let (returned, cells) = tokio::task::spawn_blocking(move || {
            algorithm.update(step);
            let cells = algorithm.current_cells();
            (algorithm, cells)
        })
        .await?;
        algorithm = returned;
        permit.send(cells);
        produced += 1;
    }

    info!(
        algorithm = algorithm.name(),
        produced, "generation stream stopped"
    );
    Ok(algorithm)
}

impl Iterator for GenerationStream {
    type Item = SparseCellSet;

    /// Blocks until the next generation is ready; `None` if the worker failed.
    fn next(&mut self) -> Option<SparseCellSet> {
        self.receiver.blocking_recv()
    }
}

impl Drop for GenerationStream {
    fn drop(&mut self) {
        self.receiver.close();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Generation sequence whose engine can be replaced while it is consumed.
///
/// Switching cancels the production of the old engine and resumes from the
/// most recently emitted state with the new one, so consumers observe one
/// uninterrupted sequence.
pub struct AlgorithmSwitch {
    stream: GenerationStream,
    last_emitted: SparseCellSet,
    step: u64,
}

impl AlgorithmSwitch {
    /// # Errors
    ///
    /// Returns an error if the worker runtime cannot be built.
    pub fn new(algorithm: Box<dyn LifeAlgorithm>, initial: SparseCellSet, step: u64) -> Result<Self> {
        let stream = GenerationStream::spawn(algorithm, initial.clone(), step)?;
        Ok(Self {
            stream,
            last_emitted: initial,
            step,
        })
    }

    /// Replaces the engine; the next element is `step` generations after
    /// [`Self::last_emitted`].
    ///
    /// # Errors
    ///
    /// Returns an error if the worker runtime cannot be built, in which case
    /// the previous engine keeps producing.
    pub fn switch_algorithm(&mut self, algorithm: Box<dyn LifeAlgorithm>) -> Result<()> {
        let name = algorithm.name();
        let stream = GenerationStream::spawn(algorithm, self.last_emitted.clone(), self.step)?;
        drop(std::mem::replace(&mut self.stream, stream));
        info!(algorithm = name, "switched algorithm");
        Ok(())
    }

    /// The state most recently handed to the consumer, or the initial one.
    pub fn last_emitted(&self) -> &SparseCellSet {
        &self.last_emitted
    }
}

impl Iterator for AlgorithmSwitch {
    type Item = SparseCellSet;

    fn next(&mut self) -> Option<SparseCellSet> {
        let cells = self.stream.next()?;
        self.last_emitted = cells.clone();
        Some(cells)
    }
}
