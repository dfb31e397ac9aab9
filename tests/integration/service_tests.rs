//! Integration tests for the request → assemble → transmit → echo pipeline.

use crate::mock_dev::{MockDevice, RecordingSink, run_timers_until, service};

use hoodctl::Error;
use hoodctl::adapters::log_sink::LogEventSink;
use hoodctl::adapters::memory_store::MemoryStore;
use hoodctl::app::commands::AppCommand;
use hoodctl::app::events::{AppEvent, SignalSource};
use hoodctl::app::ports::{ConfigPort, StorageError, TimePort};
use hoodctl::app::service::HoodService;
use hoodctl::config::HoodConfig;
use hoodctl::hood::outbound::HoodRequest;
use hoodctl::hood::state::{HoodSettings, HoodState};
use hoodctl::hood::{Command, OnOffAction, SignalEvent, Speed, Unit};
use hoodctl::timers::TimerPurpose;

// ── Power on, then ramp to speed 3 ───────────────────────────

#[test]
fn power_on_then_ramp_to_three() {
    let mut svc = service();
    let mut dev = MockDevice::new();
    let mut sink = RecordingSink::new();

    let p = svc
        .handle_request(&HoodRequest::onoff(true), 0, &mut dev, &mut sink)
        .unwrap();
    assert_eq!(p.unit, Unit::OnOff);
    assert_eq!(p.command, Some(Command::On));
    assert_eq!(p.speed.get(), 1);
    assert_eq!(p.speed_level, "speed_1");
    assert!(p.onoff);
    assert_eq!(dev.state().speed.get(), 1);

    let p = svc
        .handle_request(&HoodRequest::speed(Speed::saturating(3)), 1_000, &mut dev, &mut sink)
        .unwrap();
    assert_eq!(p.unit, Unit::Increase);
    assert_eq!(dev.state().target_speed, Speed::new(3));
    assert!(svc.is_armed(TimerPurpose::RampStep));

    run_timers_until(&mut svc, &mut dev, &mut sink, 2_000);

    let s = dev.state();
    assert_eq!(s.speed.get(), 3);
    assert_eq!(s.target_speed, None);
    assert_eq!(s.speed_history, Speed::new(3));
    assert_eq!(dev.units_sent(), [Unit::OnOff, Unit::Increase, Unit::Increase]);
    assert_eq!(svc.next_deadline(), None);

    let repeated = sink.count(|e| matches!(e, AppEvent::Transmitted { repeated: true, .. }));
    assert_eq!(repeated, 1);
}

#[test]
fn ramp_down_sends_one_decrease_per_level() {
    let mut svc = service();
    let mut dev = MockDevice::running_at(4);
    let mut sink = RecordingSink::new();

    svc.handle_command_str("speed_1", 0, &mut dev, &mut sink)
        .unwrap();
    run_timers_until(&mut svc, &mut dev, &mut sink, 10_000);

    assert_eq!(dev.count_sent(Unit::Decrease), 3);
    assert_eq!(dev.state().speed.get(), 1);
    assert_eq!(dev.state().target_speed, None);
}

#[test]
fn ramp_from_off_powers_up_stepwise() {
    let mut svc = service();
    let mut dev = MockDevice::new();
    let mut sink = RecordingSink::new();

    svc.handle_request(&HoodRequest::speed(Speed::MAX), 0, &mut dev, &mut sink)
        .unwrap();
    run_timers_until(&mut svc, &mut dev, &mut sink, 10_000);

    assert_eq!(dev.count_sent(Unit::Increase), 4);
    assert_eq!(dev.state().speed, Speed::MAX);
    assert!(dev.state().is_on());
}

#[test]
fn ramp_steps_are_spaced_by_step_delay() {
    let mut svc = service();
    let mut dev = MockDevice::running_at(1);
    let mut sink = RecordingSink::new();

    svc.handle_request(&HoodRequest::speed(Speed::MAX), 500, &mut dev, &mut sink)
        .unwrap();
    assert_eq!(svc.next_deadline(), Some(550));
    assert_eq!(svc.poll_timers(549, &mut dev, &mut sink).unwrap(), 0);
    assert_eq!(svc.poll_timers(550, &mut dev, &mut sink).unwrap(), 1);
    assert_eq!(svc.next_deadline(), Some(600));
}

#[test]
fn explicit_increase_clears_pending_ramp() {
    let mut svc = service();
    let mut dev = MockDevice::running_at(1);
    let mut sink = RecordingSink::new();

    svc.handle_request(&HoodRequest::speed(Speed::MAX), 0, &mut dev, &mut sink)
        .unwrap();
    assert!(svc.is_armed(TimerPurpose::RampStep));

    svc.handle_command_str("increase", 10, &mut dev, &mut sink)
        .unwrap();
    assert!(!svc.is_armed(TimerPurpose::RampStep));
    assert_eq!(dev.state().speed.get(), 3);
    assert_eq!(dev.state().target_speed, None);
}

// ── No-op suppression ────────────────────────────────────────

#[test]
fn requesting_current_speed_sends_nothing() {
    let mut svc = service();
    let mut dev = MockDevice::running_at(2);
    let mut sink = RecordingSink::new();

    let p = svc
        .handle_request(&HoodRequest::speed(Speed::saturating(2)), 0, &mut dev, &mut sink)
        .unwrap();
    assert_eq!(p.unit, Unit::None);
    assert_eq!(p.speed.get(), 2);
    assert!(dev.sent.is_empty());
    assert_eq!(dev.state().speed.get(), 2);
    assert_eq!(
        sink.events,
        [AppEvent::Suppressed(Command::Speed(Speed::saturating(2)))]
    );
}

#[test]
fn light_on_when_lit_is_suppressed() {
    let mut svc = service();
    let mut dev = MockDevice::new();
    let mut sink = RecordingSink::new();

    svc.handle_request(&HoodRequest::light(true), 0, &mut dev, &mut sink)
        .unwrap();
    assert!(dev.state().light);
    let p = svc
        .handle_request(&HoodRequest::light(true), 10, &mut dev, &mut sink)
        .unwrap();
    assert_eq!(p.unit, Unit::None);
    assert_eq!(dev.count_sent(Unit::Light), 1);
}

#[test]
fn empty_request_is_harmless() {
    let mut svc = service();
    let mut dev = MockDevice::running_at(3);
    let mut sink = RecordingSink::new();

    let p = svc
        .handle_request(&HoodRequest::default(), 0, &mut dev, &mut sink)
        .unwrap();
    assert_eq!(p.unit, Unit::None);
    assert_eq!(p.command, None);
    assert_eq!(p.speed.get(), 3);
    assert!(sink.events.is_empty());
}

// ── Policy ───────────────────────────────────────────────────

#[test]
fn onoff_with_light_policy_drives_the_light() {
    let mut svc = service();
    let mut dev = MockDevice::new();
    let mut sink = RecordingSink::new();
    dev.set_settings(HoodSettings {
        onoff_action: OnOffAction::Light,
        run_out: true,
    });

    let p = svc
        .handle_request(&HoodRequest::onoff(true), 0, &mut dev, &mut sink)
        .unwrap();
    assert_eq!(p.unit, Unit::Light);
    let s = dev.state();
    assert!(s.light);
    assert!(s.speed.is_off());
}

#[test]
fn onoff_with_hood_policy_jumps_to_remembered_speed() {
    let mut svc = service();
    let mut dev = MockDevice::with_state(HoodState {
        speed_history: Speed::new(3),
        ..HoodState::default()
    });
    let mut sink = RecordingSink::new();
    dev.set_settings(HoodSettings {
        onoff_action: OnOffAction::Hood,
        run_out: true,
    });

    let p = svc
        .handle_request(&HoodRequest::onoff(true), 0, &mut dev, &mut sink)
        .unwrap();
    assert_eq!(p.command, Some(Command::Speed(Speed::saturating(3))));
    run_timers_until(&mut svc, &mut dev, &mut sink, 10_000);
    assert_eq!(dev.state().speed.get(), 3);
    assert_eq!(dev.count_sent(Unit::Increase), 3);

    let p = svc
        .handle_request(&HoodRequest::onoff(false), 20_000, &mut dev, &mut sink)
        .unwrap();
    assert_eq!(p.command, Some(Command::Speed(Speed::OFF)));
    run_timers_until(&mut svc, &mut dev, &mut sink, 30_000);
    assert!(dev.state().speed.is_off());
    assert_eq!(dev.count_sent(Unit::Decrease), 3);
    assert_eq!(dev.count_sent(Unit::OnOff), 0);
}

#[test]
fn settings_update_is_persisted_and_announced() {
    let mut svc = service();
    let mut dev = MockDevice::running_at(2);
    let mut sink = RecordingSink::new();
    let settings = HoodSettings {
        onoff_action: OnOffAction::Hood,
        run_out: false,
    };

    let out = svc
        .handle_command(AppCommand::UpdateSettings(settings), 0, &mut dev, &mut sink)
        .unwrap();
    assert_eq!(out, None);
    assert_eq!(sink.events, [AppEvent::SettingsUpdated(settings)]);
    assert_eq!(dev.state().speed.get(), 2);
}

// ── Inbound ──────────────────────────────────────────────────

#[test]
fn remote_signal_is_applied_not_retransmitted() {
    let mut svc = service();
    let mut dev = MockDevice::new();
    let mut sink = RecordingSink::new();

    let p = svc
        .handle_signal(&SignalEvent::new("light"), 0, &mut dev, &mut sink)
        .unwrap()
        .unwrap();
    assert_eq!(p.command, Some(Command::LightOn));
    assert!(dev.sent.is_empty());
    assert_eq!(dev.reports, [p]);
    assert!(dev.state().light);
    assert_eq!(dev.state().light_history, Some(true));
    assert!(matches!(
        sink.events.as_slice(),
        [AppEvent::Applied {
            source: SignalSource::Remote,
            ..
        }]
    ));
}

#[test]
fn unknown_unit_is_ignored() {
    let mut svc = service();
    let mut dev = MockDevice::new();
    let mut sink = RecordingSink::new();

    let out = svc
        .handle_signal(&SignalEvent::new("boost"), 0, &mut dev, &mut sink)
        .unwrap();
    assert_eq!(out, None);
    assert!(dev.store.is_empty());
    assert_eq!(sink.events, [AppEvent::Ignored("boost".into())]);
}

#[test]
fn foreign_frame_is_ignored() {
    let mut svc = service();
    let mut dev = MockDevice::new();
    dev.accept = false;
    let mut sink = RecordingSink::new();

    let out = svc
        .handle_signal(&SignalEvent::new("onoff"), 0, &mut dev, &mut sink)
        .unwrap();
    assert_eq!(out, None);
    assert!(dev.store.is_empty());
}

#[test]
fn remote_steps_stay_within_bounds() {
    let mut svc = service();
    let mut dev = MockDevice::new();
    let mut sink = RecordingSink::new();

    for t in 0..8 {
        svc.handle_signal(&SignalEvent::new("increase"), t, &mut dev, &mut sink)
            .unwrap();
    }
    assert_eq!(dev.state().speed, Speed::MAX);
    for t in 8..16 {
        svc.handle_signal(&SignalEvent::new("decrease"), t, &mut dev, &mut sink)
            .unwrap();
    }
    assert!(dev.state().speed.is_off());
    assert_eq!(dev.state().speed_history, Speed::new(1));
}

// ── Errors ───────────────────────────────────────────────────

#[test]
fn rejected_intent_write_aborts_before_sending() {
    let mut svc = service();
    let mut dev = MockDevice::new();
    dev.store.set_read_only(true);
    let mut sink = RecordingSink::new();

    let err = svc
        .handle_request(&HoodRequest::speed(Speed::saturating(3)), 0, &mut dev, &mut sink)
        .unwrap_err();
    assert_eq!(err, Error::Storage(StorageError::Rejected));
    assert!(dev.sent.is_empty());
}

#[test]
fn rejected_echo_write_surfaces_after_send() {
    let mut svc = service();
    let mut dev = MockDevice::new();
    dev.store.set_read_only(true);
    let mut sink = RecordingSink::new();

    let err = svc
        .handle_request(&HoodRequest::onoff(true), 0, &mut dev, &mut sink)
        .unwrap_err();
    assert_eq!(err, Error::Storage(StorageError::Rejected));
    assert_eq!(dev.units_sent(), [Unit::OnOff]);

    // The store recovers; the next signal starts from the last persisted state.
    dev.store.set_read_only(false);
    svc.handle_signal(&SignalEvent::new("onoff"), 10, &mut dev, &mut sink)
        .unwrap();
    assert_eq!(dev.state().speed.get(), 1);
}

#[test]
fn bad_command_string_touches_nothing() {
    let mut svc = service();
    let mut dev = MockDevice::new();
    let mut sink = RecordingSink::new();

    let err = svc
        .handle_command_str("speed_9", 0, &mut dev, &mut sink)
        .unwrap_err();
    assert!(matches!(err, Error::Command(_)));
    assert!(dev.store.is_empty());
    assert!(sink.events.is_empty());
}

// ── Configuration ────────────────────────────────────────────

#[test]
fn service_picks_up_stored_config() {
    let cfg_store = MemoryStore::new();
    let cfg = HoodConfig {
        step_delay_ms: 100,
        ..HoodConfig::default()
    };
    cfg_store.save(&cfg).unwrap();

    let mut svc = HoodService::from_config_port(&cfg_store).unwrap();
    assert_eq!(svc.config(), &cfg);

    let mut dev = MockDevice::running_at(1);
    let mut sink = RecordingSink::new();
    svc.handle_request(&HoodRequest::speed(Speed::MAX), 0, &mut dev, &mut sink)
        .unwrap();
    assert_eq!(svc.next_deadline(), Some(100));
}

// ── Host loop ────────────────────────────────────────────────

struct FixedClock(u64);

impl TimePort for FixedClock {
    fn now_ms(&self) -> u64 {
        self.0
    }
}

#[test]
fn host_loop_with_clock_and_log_sink() {
    let mut svc = service();
    let mut dev = MockDevice::running_at(2);
    let mut sink = LogEventSink::new();

    svc.handle_request(&HoodRequest::speed(Speed::saturating(4)), 0, &mut dev, &mut sink)
        .unwrap();
    assert_eq!(svc.poll(&FixedClock(10), &mut dev, &mut sink).unwrap(), 0);
    assert_eq!(svc.poll(&FixedClock(50), &mut dev, &mut sink).unwrap(), 1);
    assert_eq!(dev.state().speed, Speed::MAX);
    assert_eq!(svc.transmit_count(), 2);
    assert_eq!(svc.recent_sends().count(), 2);
}
