use std::collections::BTreeMap;

use super::*;
use crate::kernel::{
    Kernel, MemoryNetwork, MemoryVehicles, NetworkKernel, VehicleKernel, VehicleRecord,
};
use crate::scenarios::{merge_kernel, spawn_platoon, MergeNetworkParams};
use crate::{Actions, Id};

/// Telemetry fixed up front; commands are recorded, never simulated.
#[derive(Default)]
struct ScriptedVehicles {
    speeds: BTreeMap<Id, f64>,
    rl: Vec<Id>,
    leaders: BTreeMap<Id, Id>,
    followers: BTreeMap<Id, Id>,
    headways: BTreeMap<Id, f64>,
    accels: Vec<(Id, f64)>,
    observed: Vec<Id>,
}

impl ScriptedVehicles {
    fn vehicle(mut self, id: &str, speed: f64, rl: bool) -> Self {
        self.speeds.insert(id.into(), speed);
        if rl {
            self.rl.push(id.into());
        }
        self
    }

    fn leads(mut self, follower: &str, leader: &str, headway: f64) -> Self {
        self.leaders.insert(follower.into(), leader.into());
        self.followers.insert(leader.into(), follower.into());
        self.headways.insert(follower.into(), headway);
        self
    }
}

impl VehicleKernel for ScriptedVehicles {
    fn ids(&self) -> Vec<Id> {
        self.speeds.keys().cloned().collect()
    }
    fn rl_ids(&self) -> Vec<Id> {
        self.rl.clone()
    }
    fn speed(&self, id: &str) -> f64 {
        self.speeds.get(id).copied().unwrap_or(-1001.0)
    }
    fn position(&self, _id: &str) -> f64 {
        0.0
    }
    fn lane(&self, _id: &str) -> usize {
        0
    }
    fn edge(&self, _id: &str) -> Id {
        "main".into()
    }
    fn leader(&self, id: &str) -> Option<Id> {
        self.leaders.get(id).cloned()
    }
    fn follower(&self, id: &str) -> Option<Id> {
        // Simulators may report "nobody" as an empty id.
        Some(self.followers.get(id).cloned().unwrap_or_default())
    }
    fn headway(&self, id: &str) -> f64 {
        self.headways.get(id).copied().unwrap_or(1000.0)
    }
    fn x_by_id(&self, _id: &str) -> f64 {
        0.0
    }
    fn ids_by_edge(&self, _edge: &str) -> Vec<Id> {
        self.ids()
    }
    fn apply_acceleration(&mut self, id: &str, accel: f64) {
        self.accels.push((id.into(), accel));
    }
    fn set_observed(&mut self, id: &str) {
        self.observed.push(id.into());
    }
}

struct ScriptedNetwork;

impl NetworkKernel for ScriptedNetwork {
    fn max_speed(&self) -> f64 {
        30.0
    }
    fn length(&self) -> f64 {
        100.0
    }
    fn edge_length(&self, _edge: &str) -> f64 {
        100.0
    }
    fn speed_limit(&self, _edge: &str) -> f64 {
        30.0
    }
    fn prev_edge(&self, _edge: &str, _lane: usize) -> Vec<(Id, usize)> {
        Vec::new()
    }
    fn junction_list(&self) -> Vec<Id> {
        Vec::new()
    }
    fn edge_start(&self, _edge: &str) -> Option<f64> {
        None
    }
}

fn scripted() -> Kernel<ScriptedVehicles, ScriptedNetwork> {
    let vehicles = ScriptedVehicles::default()
        .vehicle("a", 10.0, true)
        .vehicle("b", 15.0, false)
        .leads("a", "b", 5.0);
    Kernel::new(vehicles, ScriptedNetwork)
}

fn env(variant: EnvVariant) -> MultiAgentHighwayEnv {
    MultiAgentHighwayEnv::new(EnvParams::with_defaults(), variant).unwrap()
}

fn no_op(ids: &[&str]) -> Actions {
    ids.iter().map(|id| (id.to_string(), vec![0.0])).collect()
}

#[test]
fn base_observation_of_scripted_agent() {
    let k = scripted();
    let obs = env(EnvVariant::HighwayPo).get_state(&k);
    let expected = [10.0 / 30.0, 5.0 / 30.0, 0.05, 10.0 / 30.0, 1.0];
    assert_eq!(obs.len(), 1);
    for (got, want) in obs["a"].iter().zip(expected) {
        assert!((got - want).abs() < 1e-9, "{got} != {want}");
    }
}

#[test]
fn evaluation_reward_is_raw_speed() {
    let k = scripted();
    let mut e = env(EnvVariant::HighwayPo);
    e.params.evaluate = true;
    let actions = no_op(&["a"]);
    for fail in [false, true] {
        assert_eq!(e.compute_reward(&k, Some(&actions), fail)["a"], 10.0);
    }
}

#[test]
fn failure_zeroes_base_but_not_baselines() {
    let k = scripted();
    let actions = no_op(&["a"]);
    assert_eq!(env(EnvVariant::HighwayPo).compute_reward(&k, Some(&actions), true)["a"], 0.0);
    assert_eq!(
        env(EnvVariant::HighwayPoNegative).compute_reward(&k, Some(&actions), true)["a"],
        -0.1
    );
    let collab = env(EnvVariant::HighwayPoCollaborate);
    let ok = collab.compute_reward(&k, Some(&actions), false)["a"];
    let failed = collab.compute_reward(&k, Some(&actions), true)["a"];
    assert_eq!(ok, failed);
    assert!((ok - (-0.5 + 12.5 / 30.0 * 0.5)).abs() < 1e-12);
}

#[test]
fn missing_actions_or_agents_give_empty_rewards() {
    let k = scripted();
    for v in EnvVariant::ALL {
        assert!(env(v).compute_reward(&k, None, false).is_empty());
    }
    let empty = Kernel::new(ScriptedVehicles::default(), ScriptedNetwork);
    let actions = Actions::new();
    assert!(env(EnvVariant::HighwayPo)
        .compute_reward(&empty, Some(&actions), false)
        .is_empty());
    assert!(env(EnvVariant::HighwayPo).get_state(&empty).is_empty());
}

#[test]
fn local_reward_without_predecessors() {
    let k = scripted();
    let actions = no_op(&["a"]);
    let r = env(EnvVariant::HighwayPoLocalReward).compute_reward(&k, Some(&actions), false);
    // Both scripted vehicles sit at position 0 on the same lane; only `b`
    // counts as a neighbor of `a`.
    assert!((r["a"] - 15.0 / 30.0).abs() < 1e-12);
    assert_eq!(
        env(EnvVariant::HighwayPoLocalReward).compute_reward(&k, Some(&actions), true)["a"],
        0.0
    );
}

#[test]
fn lone_scripted_agent_local_reward_is_zero() {
    let k = Kernel::new(ScriptedVehicles::default().vehicle("a", 20.0, true), ScriptedNetwork);
    let actions = no_op(&["a"]);
    let r = env(EnvVariant::HighwayPoLocalReward).compute_reward(&k, Some(&actions), false);
    assert_eq!(r["a"], 0.0);
}

#[test]
fn variant_parts_are_exposed() {
    let e = env(EnvVariant::HighwayPoLocalReward);
    assert_eq!(e.encoder(), &ObservationEncoder::Base);
    assert_eq!(e.strategy(), &RewardStrategy::LocalAverage);
    assert_eq!(e.time_step(), 0);
}

#[test]
fn dispatch_and_visibility_through_traits() {
    let mut k = scripted();
    let e = env(EnvVariant::HighwayPo);
    let actions = BTreeMap::from([("a".to_string(), vec![0.7, 1.0])]);
    e.apply_rl_actions(&mut k, Some(&actions));
    e.additional_command(&mut k);
    assert_eq!(k.vehicle.accels, vec![("a".to_string(), 0.7)]);
    // Empty follower id is not marked.
    assert_eq!(k.vehicle.observed, vec!["b".to_string()]);
}

#[test]
fn missing_target_velocity_rejected() {
    let mut params = EnvParams::with_defaults();
    params.additional_params.remove("target_velocity");
    let err = MultiAgentHighwayEnv::new(params, EnvVariant::HighwayPo).unwrap_err();
    assert_eq!(err, EnvError::MissingParameter("target_velocity".into()));
}

#[test]
fn spaces_follow_variant_and_params() {
    let e = MultiAgentHighwayEnv::new(
        EnvParams::with_defaults()
            .with_param("max_accel", 2.0)
            .with_param("max_decel", 3.0),
        EnvVariant::HighwayPoMergeInfoNegative,
    )
    .unwrap();
    assert_eq!(e.observation_space().shape(), (7,));
    assert_eq!(e.action_space().low, vec![-3.0]);
    assert_eq!(e.action_space().high, vec![2.0]);
}

#[test]
fn merge_layout_validation() {
    let k = merge_kernel(&MergeNetworkParams::default()).unwrap();
    assert!(env(EnvVariant::HighwayPoMergeInfo)
        .validate_layout(&k.network)
        .is_ok());
    assert!(env(EnvVariant::HighwayPo)
        .validate_layout(&MemoryNetwork::new())
        .is_ok());
    assert_eq!(
        env(EnvVariant::HighwayPoMergeInfo).validate_layout(&MemoryNetwork::new()),
        Err(EnvError::UnknownEdge("bottom".into()))
    );
}

fn platoon() -> Kernel<MemoryVehicles, MemoryNetwork> {
    let mut k = merge_kernel(&MergeNetworkParams::default()).unwrap();
    spawn_platoon(&mut k, "left", 4, 30.0, 20.0, 2).unwrap();
    k
}

#[test]
fn step_rolls_out_to_horizon() {
    let mut k = platoon();
    let mut e = MultiAgentHighwayEnv::new(
        EnvParams::with_defaults().with_horizon(3),
        EnvVariant::HighwayPo,
    )
    .unwrap();
    let obs = e.reset(&mut k);
    assert_eq!(obs.len(), 2);

    for t in 1..=3 {
        let actions: Actions = obs.keys().map(|id| (id.clone(), vec![0.0])).collect();
        let result = e.step(&mut k, Some(&actions));
        assert_eq!(result.time_step, t);
        assert_eq!(e.time_step(), t);
        assert!(!result.crashed);
        assert_eq!(result.done, t == 3);
        assert_eq!(result.rewards.len(), 2);
        assert!(result.rewards.values().all(|r| (0.0..=1.0).contains(r)));
    }
}

#[test]
fn warmup_ignores_actions() {
    let mut k = platoon();
    let mut e = MultiAgentHighwayEnv::new(
        EnvParams::with_defaults().with_warmup_steps(1),
        EnvVariant::HighwayPoNegative,
    )
    .unwrap();
    let obs = e.reset(&mut k);
    let actions: Actions = obs.keys().map(|id| (id.clone(), vec![1.0])).collect();

    let first = e.step(&mut k, Some(&actions));
    assert!(first.rewards.is_empty());
    assert!(obs.keys().all(|id| k.vehicle.applied_acceleration(id).is_none()));

    let second = e.step(&mut k, Some(&actions));
    assert_eq!(second.rewards.len(), 2);
    assert!(obs.keys().all(|id| k.vehicle.applied_acceleration(id) == Some(1.0)));
}

#[test]
fn crash_ends_rollout() {
    let mut k = merge_kernel(&MergeNetworkParams::default()).unwrap();
    k.add_vehicle(Some("lead".into()), VehicleRecord::human("left", 0, 60.0, 0.0))
        .unwrap();
    k.add_vehicle(Some("a".into()), VehicleRecord::rl("left", 0, 50.0, 20.0))
        .unwrap();
    let mut e = env(EnvVariant::HighwayPo);
    e.reset(&mut k);
    let actions = no_op(&["a"]);
    let result = e.step(&mut k, Some(&actions));
    assert!(result.crashed);
    assert!(result.done);
    assert_eq!(result.rewards["a"], 0.0);
}

#[test]
fn step_marks_observed_neighbors() {
    let mut k = platoon();
    let mut e = env(EnvVariant::HighwayPo);
    e.reset(&mut k);
    e.step(&mut k, None);
    // left_2 trails left_1 and leads left_3, the two agents.
    assert!(k.vehicle.is_observed("left_2"));
    assert!(!k.vehicle.is_observed("left_1"));
}
