use std::io::{BufRead, Write};

use tracing::{debug, info, warn};

use crate::env::registry::{self, Registry};
use crate::env::vec_env::step_with_autoreset;
use crate::env::{Env, EnvError};
use crate::factory::EnvDescriptor;
use crate::runtime::codec;
use crate::runtime::protocol::{Reply, Request, Response, WireError};

/// What the loop should do after answering a request.
enum Flow {
    Continue,
    Exit,
}

/// Serves one environment over a line-oriented request/response channel.
///
/// The first request must be `Init`. If the environment cannot be built the
/// error is sent back as the `Init` response and the loop exits. The loop
/// also exits after `Close` or when `reader` reaches end of input. A line
/// that does not decode is answered with an error; the session goes on if
/// an environment is already running.
pub fn serve<R, W>(registry: &Registry, reader: R, mut writer: W) -> Result<(), EnvError>
where
    R: BufRead,
    W: Write,
{
    let mut env: Option<Box<dyn Env>> = None;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (response, flow) = match codec::decode::<Request>(&line) {
            Ok(request) => handle(registry, &mut env, request),
            Err(err) => {
                warn!(%err, "worker received a malformed request");
                // Before init the parent treats any reply as the init result.
                let flow = if env.is_some() { Flow::Continue } else { Flow::Exit };
                (Err(WireError::from(&err)), flow)
            }
        };
        writer.write_all(&codec::encode(&response)?)?;
        writer.flush()?;
        if let Flow::Exit = flow {
            break;
        }
    }
    Ok(())
}

fn handle(
    registry: &Registry,
    slot: &mut Option<Box<dyn Env>>,
    request: Request,
) -> (Response, Flow) {
    let env = match slot.as_mut() {
        Some(env) => env,
        None => {
            return match request {
                Request::Init { descriptor } => init(registry, slot, descriptor),
                _ => (
                    Err(WireError::other("worker received a request before init")),
                    Flow::Exit,
                ),
            };
        }
    };

    let (result, flow) = match request {
        Request::Init { .. } => {
            return (
                Err(WireError::other("worker is already initialized")),
                Flow::Continue,
            );
        }
        Request::Reset => (env.reset().map(Reply::Observation), Flow::Continue),
        Request::Step { action } => (
            step_with_autoreset(env.as_mut(), &action).map(Reply::Step),
            Flow::Continue,
        ),
        Request::Seed { seed } => {
            env.seed(seed);
            (Ok(Reply::Seeded), Flow::Continue)
        }
        Request::Render => {
            let frame = match env.render() {
                None => Ok(Reply::Frame(None)),
                Some(frame) => frame.map(|image| Reply::Frame(Some(image))),
            };
            (frame, Flow::Continue)
        }
        Request::Spaces => (Ok(Reply::Spaces(env.spaces())), Flow::Continue),
        Request::Close => (env.close().map(|()| Reply::Closed), Flow::Exit),
    };
    (result.map_err(|err| WireError::from(&err)), flow)
}

fn init(
    registry: &Registry,
    slot: &mut Option<Box<dyn Env>>,
    descriptor: EnvDescriptor,
) -> (Response, Flow) {
    match descriptor.build(registry) {
        Ok(env) => {
            debug!(
                env_id = %descriptor.env_id,
                rank = descriptor.rank,
                seed = descriptor.seed(),
                "worker environment ready"
            );
            *slot = Some(env);
            (Ok(Reply::Ready), Flow::Continue)
        }
        Err(err) => {
            info!(env_id = %descriptor.env_id, %err, "worker failed to build environment");
            (Err(WireError::from(&err)), Flow::Exit)
        }
    }
}

/// Serves the process-wide registry over stdin/stdout.
///
/// Environments registered before this call are available to the parent.
/// Log output must go to stderr: stdout carries the protocol.
pub fn run_worker() -> Result<(), EnvError> {
    let registry = registry::global()
        .read()
        .map_err(|_| EnvError::Protocol("registry lock poisoned".to_string()))?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    serve(&registry, stdin.lock(), stdout.lock())
}
