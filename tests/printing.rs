//! End-to-end print jobs against the recording transport.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tapeprint::error::FaultCode;
use tapeprint::orchestrator::JobError;
use tapeprint::protocol::DeviceStatus;
use tapeprint::session::{PrinterSession, SessionState, SharedSession};
use tapeprint::transmit::{SendStep, extended_mode_for};
use tapeprint::transport::recording::{Call, CallKind, RecordingConnector};
use tapeprint::{LabelPrinter, LabelRequest, LabelSettings, PrintJob, TapeprintError};

fn ready(tape_width_mm: u8) -> DeviceStatus {
    DeviceStatus {
        model: 0x71,
        tape_width_mm,
        ..Default::default()
    }
}

fn printer(connector: &RecordingConnector) -> LabelPrinter {
    let session = PrinterSession::new("/dev/rfcomm0", Arc::new(connector.clone()));
    LabelPrinter::new(SharedSession::new(session), LabelSettings::default())
}

fn request(text: &str) -> LabelRequest {
    LabelRequest {
        text: text.to_string(),
        ..Default::default()
    }
}

/// `no_chain_printing` flag of every extended-mode command, in order.
fn chain_flags(connector: &RecordingConnector) -> Vec<bool> {
    connector
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::SetExtendedMode(mode) => Some(!mode.no_chain_printing),
            _ => None,
        })
        .collect()
}

#[test]
fn test_copies_chain_all_but_last() {
    let connector = RecordingConnector::with_status(ready(12));
    let report = printer(&connector)
        .print(&request("Fuses"), PrintJob::new(3, false))
        .unwrap();

    assert_eq!(report.copies_printed, 3);
    assert_eq!(chain_flags(&connector), vec![true, true, false]);
    assert_eq!(connector.count(CallKind::PrintAndEject), 3);
}

#[test]
fn test_chain_flag_keeps_last_copy_chained() {
    let connector = RecordingConnector::with_status(ready(12));
    printer(&connector)
        .print(&request("Fuses"), PrintJob::new(3, true))
        .unwrap();

    assert_eq!(chain_flags(&connector), vec![true, true, true]);
}

#[test]
fn test_single_copy_is_cut() {
    let connector = RecordingConnector::with_status(ready(24));
    printer(&connector)
        .print(&request("One"), PrintJob::default())
        .unwrap();

    assert_eq!(chain_flags(&connector), vec![false]);
}

#[test]
fn test_full_command_trace() {
    let connector = RecordingConnector::with_status(ready(12));
    let report = printer(&connector)
        .print(&request("Trace"), PrintJob::default())
        .unwrap();

    let calls = connector.calls();
    let image_len = calls
        .iter()
        .find_map(|c| match c {
            Call::SendImage(n) => Some(*n),
            _ => None,
        })
        .unwrap();

    assert_eq!(
        calls,
        vec![
            Call::Open {
                address: "/dev/rfcomm0".into(),
                tape_width_mm: 0
            },
            Call::RequestStatus,
            Call::ReadStatus,
            Call::Close,
            Call::Open {
                address: "/dev/rfcomm0".into(),
                tape_width_mm: 12
            },
            Call::SetPrintProperty(report.label.width()),
            Call::SetRasterMode,
            Call::SetFeedAmount(0),
            Call::SetCompression(true),
            Call::SetPrintMode {
                auto_cut: true,
                mirror: false
            },
            Call::SetExtendedMode(extended_mode_for(false)),
            Call::SendImage(image_len),
            Call::PrintAndEject,
        ]
    );
}

#[test]
fn test_failure_at_copy_k_stops_batch() {
    let connector = RecordingConnector::with_status(ready(12));
    connector.fail_on(CallKind::PrintAndEject, 3);
    let printer = printer(&connector);

    let err = printer
        .print(&request("Batch"), PrintJob::new(5, false))
        .unwrap_err();

    match &err {
        JobError::CopyFailed {
            copy,
            printed,
            error,
        } => {
            assert_eq!(*copy, 3);
            assert_eq!(*printed, 2);
            assert_eq!(error.failed_step(), Some(SendStep::PrintAndEject));
        }
        other => panic!("unexpected error: {other}"),
    }
    // Nothing of copies 4 and 5 reached the device
    assert_eq!(connector.count(CallKind::SetPrintProperty), 3);
    assert_eq!(connector.count(CallKind::PrintAndEject), 3);
    assert_eq!(printer.session().lock().state(), SessionState::Disconnected);
}

#[test]
fn test_next_job_reconnects_after_failure() {
    let connector = RecordingConnector::with_status(ready(12));
    connector.fail_on(CallKind::SendImage, 1);
    let printer = printer(&connector);

    assert!(printer.print(&request("A"), PrintJob::default()).is_err());
    let before = connector.calls().len();

    let report = printer.print(&request("A"), PrintJob::default()).unwrap();
    assert_eq!(report.copies_printed, 1);
    assert_eq!(
        connector.calls()[before],
        Call::Open {
            address: "/dev/rfcomm0".into(),
            tape_width_mm: 0
        }
    );
}

#[test]
fn test_fault_blocks_printing_but_not_preview() {
    let connector = RecordingConnector::with_status(DeviceStatus {
        error_code2: 0x01,
        ..ready(12)
    });
    let printer = printer(&connector);

    let err = printer
        .print(&request("Blocked"), PrintJob::new(2, false))
        .unwrap_err();
    assert!(matches!(
        err.error(),
        TapeprintError::DeviceFault {
            code: FaultCode::Error2,
            value: 1
        }
    ));
    assert_eq!(err.printed(), 0);
    assert_eq!(connector.count(CallKind::SetPrintProperty), 0);

    let preview = printer.preview(&request("Blocked"));
    assert_eq!(preview.state, SessionState::Faulted);
    assert!(matches!(
        preview.session_error,
        Some(TapeprintError::DeviceFault { .. })
    ));
    assert_eq!(preview.label.unwrap().height(), 64);
    assert_eq!(connector.count(CallKind::SendImage), 0);
}

#[test]
fn test_label_sized_from_width_discovered_in_same_job() {
    let connector = RecordingConnector::default();
    connector.push_status(ready(24));
    let printer = printer(&connector);

    let report = printer
        .print(&request("Wide"), PrintJob::default())
        .unwrap();
    assert_eq!(report.status.tape_width_mm, 24);
    assert_eq!(report.label.height(), 128);

    let opens: Vec<u8> = connector
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Open { tape_width_mm, .. } => Some(tape_width_mm),
            _ => None,
        })
        .collect();
    assert_eq!(opens, vec![0, 24]);
}

#[test]
fn test_concurrent_jobs_do_not_interleave() {
    let connector = RecordingConnector::with_status(ready(12));
    connector.set_delay(Duration::from_millis(1));
    let printer = printer(&connector);

    let handles: Vec<_> = (0..3)
        .map(|i| {
            let printer = printer.clone();
            thread::spawn(move || {
                printer
                    .print(&request(&format!("Job {i}")), PrintJob::new(2, false))
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().copies_printed, 2);
    }

    // Each job's calls form one contiguous block
    let records = connector.records();
    let switches = records
        .windows(2)
        .filter(|w| w[0].thread != w[1].thread)
        .count();
    assert_eq!(switches, 2);
    assert_eq!(connector.count(CallKind::PrintAndEject), 6);
}
