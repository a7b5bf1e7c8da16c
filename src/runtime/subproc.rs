use futures::future::join_all;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::env::render::RenderSource;
use crate::env::vec_env::{check_action_count, derive_seed};
use crate::env::{Action, EnvError, EnvSpaces, Image, Observation, Step, VecEnv};
use crate::factory::EnvDescriptor;
use crate::runtime::codec;
use crate::runtime::command::WorkerCommand;
use crate::runtime::protocol::{Reply, Request, Response, WireError};

struct Worker {
    rank: usize,
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    /// The `Init` response has not been read yet.
    init_pending: bool,
    /// Set once the worker reported that its environment could not be built.
    init_error: Option<WireError>,
}

impl Worker {
    async fn spawn(
        rank: usize,
        descriptor: &EnvDescriptor,
        command: &WorkerCommand,
    ) -> Result<Self, EnvError> {
        let mut child = command.command().spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EnvError::Protocol("worker stdin is not piped".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EnvError::Protocol("worker stdout is not piped".to_string()))?;
        debug!(rank, pid = ?child.id(), "spawned environment worker");

        let mut worker = Self {
            rank,
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            init_pending: true,
            init_error: None,
        };
        worker
            .send(&Request::Init {
                descriptor: descriptor.clone(),
            })
            .await?;
        Ok(worker)
    }

    async fn send(&mut self, request: &Request) -> Result<(), EnvError> {
        self.stdin.write_all(&codec::encode(request)?).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Response, EnvError> {
        let line = self
            .stdout
            .next_line()
            .await?
            .ok_or_else(|| EnvError::Worker {
                rank: self.rank,
                message: "worker exited unexpectedly".to_string(),
            })?;
        codec::decode(&line)
    }

    /// Reads the deferred `Init` response, if it is still outstanding.
    ///
    /// A construction failure is remembered and reported on every later call.
    async fn ensure_ready(&mut self) -> Result<(), EnvError> {
        if self.init_pending {
            self.init_pending = false;
            match self.recv().await? {
                Ok(Reply::Ready) => {}
                Ok(other) => return Err(unexpected(self.rank, "ready", &other)),
                Err(err) => self.init_error = Some(err),
            }
        }
        match &self.init_error {
            Some(err) => Err(err.clone().into_env_error(self.rank)),
            None => Ok(()),
        }
    }

    async fn call(&mut self, request: &Request) -> Result<Reply, EnvError> {
        self.ensure_ready().await?;
        self.send(request).await?;
        let rank = self.rank;
        self.recv()
            .await?
            .map_err(|err| err.into_env_error(rank))
    }

    /// Asks the worker to close, then waits for it to exit.
    ///
    /// The child is reaped on every path; the first failure is returned.
    async fn shutdown(&mut self) -> Result<(), EnvError> {
        // A worker whose environment failed to build has already exited.
        let closed = match self.ensure_ready().await {
            Ok(()) => match self.call(&Request::Close).await {
                Ok(Reply::Closed) => Ok(()),
                Ok(other) => Err(unexpected(self.rank, "closed", &other)),
                Err(err) => Err(err),
            },
            Err(_) => Ok(()),
        };
        if closed.is_err() {
            if let Err(err) = self.child.start_kill() {
                debug!(rank = self.rank, %err, "worker already gone");
            }
        }
        let status = self.child.wait().await;
        closed?;

        let status = status?;
        if !status.success() {
            return Err(EnvError::Worker {
                rank: self.rank,
                message: format!("worker exited with {status}"),
            });
        }
        Ok(())
    }
}

fn unexpected(rank: usize, expected: &str, got: &Reply) -> EnvError {
    EnvError::Protocol(format!(
        "worker {rank} answered `{}`, expected `{expected}`",
        got.name()
    ))
}

/// Runs each environment instance in its own freshly spawned worker process.
///
/// Calls are synchronous: each one is sent to every worker at once and
/// returns when all of them have answered, so a call takes as long as the
/// slowest worker. Construction errors inside a worker surface on the first
/// call, not from [`SubprocVecEnv::spawn`].
///
/// The handle drives its workers on a private current-thread tokio runtime,
/// so it must not be used from inside an async context.
pub struct SubprocVecEnv {
    workers: Vec<Worker>,
    id: Uuid,
    spaces: Option<EnvSpaces>,
    closed: bool,
    runtime: Runtime,
}

impl SubprocVecEnv {
    /// Starts one worker per descriptor, in rank order.
    ///
    /// Fails only if a worker process cannot be started; workers that were
    /// already running are killed in that case.
    pub fn spawn(descriptors: &[EnvDescriptor], command: &WorkerCommand) -> Result<Self, EnvError> {
        if descriptors.is_empty() {
            return Err(EnvError::InvalidConstructionArgs(
                "Must provide at least one environment".to_string(),
            ));
        }

        let runtime = Builder::new_current_thread().enable_all().build()?;
        let id = Uuid::new_v4();
        let workers = runtime.block_on(async {
            let mut workers = Vec::with_capacity(descriptors.len());
            for (rank, descriptor) in descriptors.iter().enumerate() {
                workers.push(Worker::spawn(rank, descriptor, command).await?);
            }
            Ok::<_, EnvError>(workers)
        })?;
        info!(%id, workers = workers.len(), program = ?command.program, "started environment workers");

        Ok(Self {
            workers,
            id,
            spaces: None,
            closed: false,
            runtime,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// OS process ids of the workers that are still running, in rank order.
    pub fn worker_pids(&self) -> Vec<Option<u32>> {
        self.workers.iter().map(|worker| worker.child.id()).collect()
    }

    /// Sends one request per worker and gathers the replies in rank order.
    ///
    /// Every worker is waited on; the error of the lowest failing rank wins.
    fn broadcast<F>(&mut self, make_request: F) -> Result<Vec<Reply>, EnvError>
    where
        F: Fn(usize) -> Request,
    {
        if self.closed {
            return Err(EnvError::Closed);
        }
        let requests: Vec<Request> = (0..self.workers.len()).map(make_request).collect();
        let workers = &mut self.workers;
        let replies = self.runtime.block_on(join_all(
            workers
                .iter_mut()
                .zip(&requests)
                .map(|(worker, request)| worker.call(request)),
        ));
        replies.into_iter().collect()
    }
}

impl VecEnv for SubprocVecEnv {
    fn num_envs(&self) -> usize {
        self.workers.len()
    }

    fn spaces(&mut self) -> Result<EnvSpaces, EnvError> {
        if let Some(spaces) = &self.spaces {
            return Ok(spaces.clone());
        }
        if self.closed {
            return Err(EnvError::Closed);
        }
        let first = &mut self.workers[0];
        let spaces = match self.runtime.block_on(first.call(&Request::Spaces))? {
            Reply::Spaces(spaces) => spaces,
            other => return Err(unexpected(0, "spaces", &other)),
        };
        self.spaces = Some(spaces.clone());
        Ok(spaces)
    }

    fn reset(&mut self) -> Result<Vec<Observation>, EnvError> {
        self.broadcast(|_| Request::Reset)?
            .into_iter()
            .enumerate()
            .map(|(rank, reply)| match reply {
                Reply::Observation(obs) => Ok(obs),
                other => Err(unexpected(rank, "observation", &other)),
            })
            .collect()
    }

    fn step(&mut self, actions: &[Action]) -> Result<Vec<Step>, EnvError> {
        check_action_count(self.workers.len(), actions)?;

        self.broadcast(|rank| Request::Step {
            action: actions[rank].clone(),
        })?
        .into_iter()
        .enumerate()
        .map(|(rank, reply)| match reply {
            Reply::Step(step) => Ok(step),
            other => Err(unexpected(rank, "step", &other)),
        })
        .collect()
    }

    fn seed(&mut self, seed: u64) -> Result<(), EnvError> {
        for (rank, reply) in self
            .broadcast(|rank| Request::Seed {
                seed: derive_seed(seed, rank),
            })?
            .into_iter()
            .enumerate()
        {
            if reply != Reply::Seeded {
                return Err(unexpected(rank, "seeded", &reply));
            }
        }
        Ok(())
    }

    fn get_images(&mut self) -> Option<Result<Vec<Image>, EnvError>> {
        let replies = match self.broadcast(|_| Request::Render) {
            Ok(replies) => replies,
            Err(err) => return Some(Err(err)),
        };
        let mut images = Vec::with_capacity(replies.len());
        for (rank, reply) in replies.into_iter().enumerate() {
            match reply {
                Reply::Frame(Some(image)) => images.push(image),
                Reply::Frame(None) => return None,
                other => return Some(Err(unexpected(rank, "frame", &other))),
            }
        }
        Some(Ok(images))
    }

    /// Shuts every worker down and waits for it to exit.
    ///
    /// All workers are closed even if some fail; the first failure is
    /// returned. Closing twice is a no-op.
    fn close(&mut self) -> Result<(), EnvError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let id = self.id;
        let workers = &mut self.workers;
        let results = self
            .runtime
            .block_on(join_all(workers.iter_mut().map(|worker| worker.shutdown())));

        let mut first_error = None;
        for (rank, result) in results.into_iter().enumerate() {
            if let Err(err) = result {
                warn!(%id, rank, %err, "environment worker did not shut down cleanly");
                first_error.get_or_insert(err);
            }
        }
        debug!(%id, "closed environment workers");
        first_error.map_or(Ok(()), Err)
    }
}

impl RenderSource for SubprocVecEnv {
    fn images(&mut self) -> Option<Result<Vec<Image>, EnvError>> {
        self.get_images()
    }
}

impl Drop for SubprocVecEnv {
    fn drop(&mut self) {
        if !self.closed {
            // Children are spawned with kill_on_drop.
            debug!(id = %self.id, "dropping unclosed environment workers");
        }
    }
}
