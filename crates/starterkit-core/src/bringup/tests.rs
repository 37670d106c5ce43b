use std::time::Duration;

use pretty_assertions::assert_eq;
use url::Url;

use super::*;
use crate::testing::{FakeConnector, FakeFetcher, FakeProbe, ScriptedPrompter, context};

const ARCHIVE: &[u8] = b"PK\x03\x04scripts";

fn completed_context() -> SessionContext {
    let mut ctx = context();
    ctx.resource_group = Some("rg".into());
    ctx.hub = Some("kit-hub".into());
    ctx.device = Some("pi".into());
    ctx.registry = Some("kitacr".into());
    ctx.set_hub_cs("HostName=kit-hub.azure-devices.net;SharedAccessKeyName=iothubowner;SharedAccessKey=aHVi");
    ctx.set_device_cs("HostName=kit-hub.azure-devices.net;DeviceId=pi;SharedAccessKey=ZGV2");
    ctx.set_registry_user("kitacr");
    ctx.set_registry_password("it's-secret");
    ctx
}

fn plan() -> BringupPlan {
    BringupPlan {
        interactive: false,
        ..BringupPlan::new(Url::parse(SCRIPTS_URL).unwrap())
    }
}

// ── Command construction ────────────────────────────────────────────

#[test]
fn shell_quote_wraps_and_escapes_single_quotes() {
    assert_eq!(shell_quote("plain"), "'plain'");
    assert_eq!(shell_quote(""), "''");
    assert_eq!(shell_quote("it's"), "'it'\\''s'");
    assert_eq!(shell_quote("a b;$(rm -rf /)"), "'a b;$(rm -rf /)'");
}

#[test]
fn launch_command_passes_eight_quoted_arguments_in_order() {
    let args = RunnerArgs::from_context(&completed_context()).unwrap();
    assert_eq!(
        args.launch_command(),
        "sudo nohup ./scripts/runner.sh 'home-wifi' 'wifi-pass' \
         'HostName=kit-hub.azure-devices.net;SharedAccessKeyName=iothubowner;SharedAccessKey=aHVi' \
         'pi' 'HostName=kit-hub.azure-devices.net;DeviceId=pi;SharedAccessKey=ZGV2' \
         'kitacr' 'kitacr' 'it'\\''s-secret' </dev/null >~/connect.log 2>&1 &"
    );
}

#[test]
fn runner_args_debug_hides_values() {
    let args = RunnerArgs::from_context(&completed_context()).unwrap();
    assert!(!format!("{args:?}").contains("wifi-pass"));
}

#[test]
fn runner_args_need_completed_context() {
    let mut ctx = completed_context();
    ctx.registry = None;
    assert!(matches!(
        RunnerArgs::from_context(&ctx),
        Err(CoreError::MissingSetting {
            field: "container registry"
        })
    ));
}

// ── Sequencing ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn happy_path_visits_every_state_in_order() {
    let probe = FakeProbe::new()
        .answers(NETWORK_PROBE_HOST, &[false, true])
        .answers("192.168.4.1", &[false, false, true]);
    let connector = FakeConnector::new();
    let fetcher = FakeFetcher::serving(ARCHIVE);
    let prompt = ScriptedPrompter::new();
    let ctx = completed_context();

    let mut bringup = DeviceBringup::new(&probe, &connector, &fetcher, &prompt, plan());
    let report = bringup.run(&ctx).await.unwrap();

    assert_eq!(
        report.states,
        vec![
            BringupState::AwaitingNetwork,
            BringupState::AwaitingDeviceReachable,
            BringupState::Connected,
            BringupState::PreparingRemote,
            BringupState::Transferring,
            BringupState::Executing,
            BringupState::Done,
        ]
    );
    assert_eq!(bringup.state(), Some(BringupState::Done));

    let ops = connector.ops();
    assert_eq!(ops.len(), 4);
    assert_eq!(ops[0], "upload scripts.zip");
    assert_eq!(ops[1], format!("exec {PREREQ_COMMAND}"));
    assert_eq!(ops[2], format!("exec {UNPACK_COMMAND}"));
    assert!(ops[3].starts_with("launch sudo nohup ./scripts/runner.sh 'home-wifi'"));

    let log = connector.log.lock().unwrap();
    assert_eq!(log.uploaded[0].1, ARCHIVE);
    assert_eq!(
        log.target,
        Some(("192.168.4.1".to_owned(), 22, "pi".to_owned()))
    );
    assert_eq!(
        fetcher.fetched.lock().unwrap().as_slice(),
        [Url::parse(SCRIPTS_URL).unwrap()]
    );
    assert_eq!(prompt.pauses(), 0);
    assert_eq!(log.local_copy_at_exec, Some(false));
    let dests = fetcher.dests.lock().unwrap();
    assert_eq!(log.uploaded_from.as_slice(), dests.as_slice());
    assert!(dests[0].ends_with(REMOTE_ARCHIVE));
}

#[tokio::test(start_paused = true)]
async fn channel_opens_only_after_reachability_and_settle_delay() {
    let probe = FakeProbe::new()
        .answers(NETWORK_PROBE_HOST, &[true])
        .answers("192.168.4.1", &[false, false, false, true]);
    let connector = FakeConnector::new();
    let fetcher = FakeFetcher::serving(ARCHIVE);
    let prompt = ScriptedPrompter::new();

    DeviceBringup::new(&probe, &connector, &fetcher, &prompt, plan())
        .run(&completed_context())
        .await
        .unwrap();

    let device_probes = probe.probes_of("192.168.4.1");
    assert_eq!(device_probes.len(), 4);
    let (first_success, answered_at) = device_probes[3];
    assert!(first_success);
    assert!(device_probes[..3].iter().all(|(ok, _)| !ok));
    // Polls are spaced by the interval.
    assert_eq!(device_probes[1].1 - device_probes[0].1, Duration::from_secs(2));

    let connected_at = connector.log.lock().unwrap().connected_at.unwrap();
    assert!(connected_at - answered_at >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn interactive_mode_asks_on_every_failed_poll() {
    let probe = FakeProbe::new()
        .answers(NETWORK_PROBE_HOST, &[false, false, true])
        .answers("192.168.4.1", &[false, true]);
    let connector = FakeConnector::new();
    let fetcher = FakeFetcher::serving(ARCHIVE);
    let prompt = ScriptedPrompter::new();
    let plan = BringupPlan {
        interactive: true,
        ..plan()
    };

    DeviceBringup::new(&probe, &connector, &fetcher, &prompt, plan)
        .run(&completed_context())
        .await
        .unwrap();

    assert_eq!(prompt.pauses(), 3);
}

// ── Failures ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn rejected_login_fails_before_download() {
    let probe = FakeProbe::new();
    let connector = FakeConnector::rejecting_login();
    let fetcher = FakeFetcher::serving(ARCHIVE);
    let prompt = ScriptedPrompter::new();

    let mut bringup = DeviceBringup::new(&probe, &connector, &fetcher, &prompt, plan());
    let err = bringup.run(&completed_context()).await.unwrap_err();

    match err {
        CoreError::AuthenticationFailed { user, host } => {
            assert_eq!(user, "pi");
            assert_eq!(host, "192.168.4.1");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        bringup.states(),
        [
            BringupState::AwaitingNetwork,
            BringupState::AwaitingDeviceReachable,
            BringupState::Connected,
            BringupState::Failed,
        ]
    );
    assert!(fetcher.fetched.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn download_failure_stops_before_transfer() {
    let probe = FakeProbe::new();
    let connector = FakeConnector::new();
    let fetcher = FakeFetcher::failing();
    let prompt = ScriptedPrompter::new();

    let mut bringup = DeviceBringup::new(&probe, &connector, &fetcher, &prompt, plan());
    let err = bringup.run(&completed_context()).await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::Bringup {
            state: BringupState::PreparingRemote,
            ..
        }
    ));
    assert_eq!(bringup.state(), Some(BringupState::Failed));
    assert!(connector.ops().is_empty());
    assert_eq!(prompt.warnings().len(), 1);
    assert!(prompt.warnings()[0].contains("device.scripts_url"));
}

#[tokio::test(start_paused = true)]
async fn download_failure_on_the_lan_adds_no_access_point_hint() {
    let probe = FakeProbe::new();
    let connector = FakeConnector::new();
    let fetcher = FakeFetcher::failing();
    let prompt = ScriptedPrompter::new();
    let mut ctx = completed_context();
    ctx.target.host = "10.0.0.42".into();

    let err = DeviceBringup::new(&probe, &connector, &fetcher, &prompt, plan())
        .run(&ctx)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::Bringup {
            state: BringupState::PreparingRemote,
            ..
        }
    ));
    assert!(prompt.warnings().is_empty());
}

#[tokio::test(start_paused = true)]
async fn upload_failure_stops_before_remote_commands() {
    let probe = FakeProbe::new();
    let connector = FakeConnector::failing_upload();
    let fetcher = FakeFetcher::serving(ARCHIVE);
    let prompt = ScriptedPrompter::new();

    let mut bringup = DeviceBringup::new(&probe, &connector, &fetcher, &prompt, plan());
    let err = bringup.run(&completed_context()).await.unwrap_err();

    match err {
        CoreError::Bringup { state, message } => {
            assert_eq!(state, BringupState::Transferring);
            assert!(message.contains("channel closed during scp"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        bringup.states(),
        [
            BringupState::AwaitingNetwork,
            BringupState::AwaitingDeviceReachable,
            BringupState::Connected,
            BringupState::PreparingRemote,
            BringupState::Transferring,
            BringupState::Failed,
        ]
    );
    assert_eq!(connector.ops(), vec!["upload scripts.zip"]);
}

#[tokio::test(start_paused = true)]
async fn prerequisite_failure_only_warns() {
    let probe = FakeProbe::new();
    let connector = FakeConnector::new().exiting("sudo apt update", 100);
    let fetcher = FakeFetcher::serving(ARCHIVE);
    let prompt = ScriptedPrompter::new();

    let report = DeviceBringup::new(&probe, &connector, &fetcher, &prompt, plan())
        .run(&completed_context())
        .await
        .unwrap();

    assert_eq!(report.states.last(), Some(&BringupState::Done));
    assert_eq!(prompt.warnings().len(), 1);
    assert!(connector.ops()[3].starts_with("launch "));
}

#[tokio::test(start_paused = true)]
async fn unpack_failure_does_not_launch() {
    let probe = FakeProbe::new();
    let connector = FakeConnector::new().exiting("unzip", 9);
    let fetcher = FakeFetcher::serving(ARCHIVE);
    let prompt = ScriptedPrompter::new();

    let err = DeviceBringup::new(&probe, &connector, &fetcher, &prompt, plan())
        .run(&completed_context())
        .await
        .unwrap_err();

    match err {
        CoreError::Bringup { state, message } => {
            assert_eq!(state, BringupState::Executing);
            assert!(message.contains("status 9"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!connector.ops().iter().any(|op| op.starts_with("launch")));
}

#[tokio::test(start_paused = true)]
async fn incomplete_context_fails_before_polling() {
    let probe = FakeProbe::new();
    let connector = FakeConnector::new();
    let fetcher = FakeFetcher::serving(ARCHIVE);
    let prompt = ScriptedPrompter::new();
    let mut ctx = context();
    ctx.device = Some("pi".into());

    let mut bringup = DeviceBringup::new(&probe, &connector, &fetcher, &prompt, plan());
    let err = bringup.run(&ctx).await.unwrap_err();

    assert!(matches!(err, CoreError::MissingSetting { .. }));
    assert!(bringup.states().is_empty());
    assert!(probe.log.lock().unwrap().is_empty());
}
