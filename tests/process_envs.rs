use envkit::env::registry::Registry;
use envkit::env::vec_env::TERMINAL_OBSERVATION;
use envkit::factory::{EnvDescriptor, FactoryConfig};
use envkit::runtime::WorkerCommand;
use envkit::{
    Action, ConstructionRequest, EnvError, RenderedImages, Strategy, VecEnv, VecEnvFactory,
    VecEnvHandle, get_render_images,
};

fn factory() -> VecEnvFactory {
    VecEnvFactory::new(FactoryConfig {
        worker: WorkerCommand::new(env!("CARGO_BIN_EXE_envkit-worker")),
    })
}

fn build(request: ConstructionRequest) -> VecEnvHandle {
    factory().build(&request).unwrap()
}

fn local_reset(descriptor: &EnvDescriptor) -> Vec<f32> {
    let registry = Registry::with_builtins();
    let mut env = descriptor.build(&registry).unwrap();
    env.reset().unwrap()
}

#[test]
fn test_multiple_instances_run_in_workers() {
    let mut envs = build(ConstructionRequest::new("CartPole-v1", 4).with_seed(7));
    assert_eq!(envs.strategy(), Strategy::Process);
    assert_eq!(envs.num_envs(), 4);

    let batch = envs.reset().unwrap();
    let expected: Vec<_> = envs.descriptors().iter().map(local_reset).collect();
    assert_eq!(batch, expected);

    let spaces = envs.spaces().unwrap();
    assert_eq!(spaces.observation.flat_dim().unwrap(), 4);
    envs.close().unwrap();
}

#[test]
fn test_workers_auto_reset() {
    let mut envs = build(ConstructionRequest::new("CartPole-v1", 2));
    envs.reset().unwrap();

    let actions = vec![Action::Discrete(1); 2];
    let finished = loop {
        let steps = envs.step(&actions).unwrap();
        if let Some(step) = steps.into_iter().find(|step| step.terminated) {
            break step;
        }
    };
    assert!(finished.info.contains_key(TERMINAL_OBSERVATION));
    envs.close().unwrap();
}

#[test]
fn test_reseed_offsets_by_rank() {
    let mut envs = build(ConstructionRequest::new("CartPole-v1", 3));
    envs.seed(50).unwrap();
    let batch = envs.reset().unwrap();

    let reseeded = ConstructionRequest::new("CartPole-v1", 3).with_seed(50);
    let expected: Vec<_> = reseeded.descriptors().iter().map(local_reset).collect();
    assert_eq!(batch, expected);
    envs.close().unwrap();
}

#[test]
fn test_construction_errors_are_deferred() {
    let mut envs = build(ConstructionRequest::new("Missing-v0", 2));
    assert!(matches!(envs.reset(), Err(EnvError::EnvironmentNotFound(_))));
    envs.close().unwrap();

    let mut kwargs = envkit::env::KwArgs::new();
    kwargs.insert("pole".to_string(), 1.into());
    let mut envs = build(ConstructionRequest::new("CartPole-v1", 2).with_env_kwargs(kwargs));
    assert!(matches!(
        envs.reset(),
        Err(EnvError::InvalidConstructionArgs(_))
    ));
    envs.close().unwrap();
}

#[test]
fn test_action_count_mismatch() {
    let mut envs = build(ConstructionRequest::new("CartPole-v1", 2));
    envs.reset().unwrap();
    assert!(matches!(
        envs.step(&[Action::Discrete(0)]),
        Err(EnvError::ActionCountMismatch {
            expected: 2,
            got: 1
        })
    ));
    envs.close().unwrap();
}

#[test]
fn test_render_images_from_workers() {
    let mut envs = build(ConstructionRequest::new("CartPole-v1", 4));
    envs.reset().unwrap();
    match get_render_images(&mut envs).unwrap() {
        RenderedImages::Batch(images) => {
            assert_eq!(images.len(), 4);
            assert!(images.iter().all(|image| image.channels == 3));
        }
        RenderedImages::Single(_) => panic!("expected one frame per worker"),
    }
    envs.close().unwrap();

    let mut blind = build(ConstructionRequest::new("Pendulum-v1", 2));
    blind.reset().unwrap();
    assert!(matches!(
        get_render_images(&mut blind),
        Err(EnvError::RenderingUnsupported)
    ));
    blind.close().unwrap();
}

#[test]
fn test_closed_handle_rejects_calls() {
    let mut envs = build(ConstructionRequest::new("Pendulum-v1", 2));
    envs.reset().unwrap();
    envs.close().unwrap();

    assert!(matches!(envs.reset(), Err(EnvError::Closed)));
    assert!(matches!(
        envs.step(&[Action::Continuous(vec![0.0]), Action::Continuous(vec![0.0])]),
        Err(EnvError::Closed)
    ));
    envs.close().unwrap();
}

#[test]
fn test_non_finite_actions_cross_the_process_boundary() {
    let request = |num_envs| ConstructionRequest::new("Pendulum-v1", num_envs).with_seed(5);
    let mut local = build(request(1));
    let mut remote = build(request(2));
    assert_eq!(local.strategy(), Strategy::Sequential);
    assert_eq!(remote.strategy(), Strategy::Process);
    local.reset().unwrap();
    remote.reset().unwrap();

    let expected = local.step(&[Action::Continuous(vec![f32::INFINITY])]).unwrap();
    let steps = remote
        .step(&[
            Action::Continuous(vec![f32::INFINITY]),
            Action::Continuous(vec![f32::NAN]),
        ])
        .unwrap();

    assert_eq!(steps[0].obs, expected[0].obs);
    assert_eq!(steps[0].reward, expected[0].reward);
    assert!(steps[1].reward.is_nan());
    assert!(steps[1].obs.iter().all(|value| value.is_nan()));

    // the workers are still serving
    assert_eq!(remote.reset().unwrap().len(), 2);
    local.close().unwrap();
    remote.close().unwrap();
}
