use asyn_ipc::ASYN::Structs::{Endpoint, ErrorCode, Message};
use asyn_ipc::ASYN::Table::AsynFlags;
use asyn_ipc::ASYN::{AsynError, AsyncSender, SenderBuilder};
use asyn_ipc::Core::LoopbackKernel;

const A: Endpoint = Endpoint(10);
const B: Endpoint = Endpoint(11);
const C: Endpoint = Endpoint(12);

fn msg(text: &str) -> Message {
    Message::new(1, text.as_bytes()).unwrap()
}

fn deliver_ok(kernel: &LoopbackKernel) -> usize {
    kernel.deliver(|_, _| Some(ErrorCode::OK))
}

#[test]
fn completed_slot_is_reused_on_next_send() {
    let kernel = LoopbackKernel::new();
    let mut sender: AsyncSender<_, 8> = SenderBuilder::new(&kernel).build();
    let (m1, m2) = (msg("m1"), msg("m2"));

    sender.send(A, &m1, AsynFlags::EMPTY).unwrap();
    let slot0 = sender.slot(0).unwrap();
    assert_eq!(slot0.dst, A);
    assert_eq!(slot0.msg, m1);
    assert_eq!(slot0.flags, AsynFlags::VALID);
    assert_eq!((sender.first(), sender.next()), (0, 1));
    assert_eq!(kernel.window_len(), 1);

    assert_eq!(deliver_ok(&kernel), 1);
    assert_eq!(sender.slot(0).unwrap().flags, AsynFlags::COMPLETE);

    sender.send(B, &m2, AsynFlags::EMPTY).unwrap();
    let slot0 = sender.slot(0).unwrap();
    assert_eq!((sender.first(), sender.next()), (0, 1));
    assert_eq!(slot0.dst, B);
    assert_eq!(slot0.msg, m2);
    assert_eq!(slot0.flags, AsynFlags::VALID);
    assert_eq!(kernel.pauses(), 0);
}

#[test]
fn flagged_failure_holds_the_window_until_polled() {
    let kernel = LoopbackKernel::new();
    let mut sender: AsyncSender<_, 8> = SenderBuilder::new(&kernel).build();
    let (m1, m2, m3) = (msg("m1"), msg("m2"), msg("m3"));

    sender.send(A, &m1, AsynFlags::NOTIFY_ERR).unwrap();
    kernel.deliver(|dst, _| Some(if dst == A { ErrorCode::EDEADSRCDST } else { ErrorCode::OK }));

    sender.send(B, &m2, AsynFlags::EMPTY).unwrap();
    assert_eq!(sender.first(), 0);
    assert_eq!(sender.next(), 2);
    let slot1 = sender.slot(1).unwrap();
    assert_eq!((slot1.dst, slot1.msg, slot1.flags), (B, m2, AsynFlags::VALID));
    assert_eq!(sender.undrained(), 1);

    let record = sender.poll_error().expect("failure should be reported");
    assert_eq!(record.dst, A);
    assert_eq!(record.msg, m1);
    assert_eq!(record.result, ErrorCode::EDEADSRCDST);
    assert_eq!(sender.poll_error(), None);
    assert_eq!(sender.undrained(), 0);
    // Polling never moves the cursors.
    assert_eq!((sender.first(), sender.next()), (0, 2));

    sender.send(C, &m3, AsynFlags::EMPTY).unwrap();
    assert_eq!(sender.first(), 1);
    assert_eq!(sender.next(), 3);
    assert_eq!(sender.poll_error(), None);
}

#[test]
fn unflagged_failures_are_dropped_silently() {
    let kernel = LoopbackKernel::new();
    let mut sender: AsyncSender<_, 8> = SenderBuilder::new(&kernel).build();

    sender.send(A, &msg("quiet"), AsynFlags::EMPTY).unwrap();
    sender.send(B, &msg("notify"), AsynFlags::NOTIFY).unwrap();
    kernel.deliver(|_, _| Some(ErrorCode::ENOTREADY));

    assert_eq!(sender.poll_error(), None);
    sender.send(C, &msg("next"), AsynFlags::EMPTY).unwrap();
    // Both failed slots retired, the table rewound, C went to slot 0.
    assert_eq!((sender.first(), sender.next()), (0, 1));
    assert_eq!(sender.slot(0).unwrap().dst, C);
}

#[test]
fn full_table_of_successes_recovers_without_compaction() {
    let kernel = LoopbackKernel::new();
    let mut sender: AsyncSender<_, 8> = SenderBuilder::new(&kernel).build();

    for i in 0..8 {
        sender.send(Endpoint(i), &msg("fill"), AsynFlags::EMPTY).unwrap();
    }
    assert_eq!(sender.next(), 8);
    assert_eq!(deliver_ok(&kernel), 8);

    sender.send(A, &msg("after"), AsynFlags::EMPTY).unwrap();
    assert_eq!((sender.first(), sender.next()), (0, 1));
    assert_eq!(kernel.pauses(), 0);
}

#[test]
fn full_table_compacts_around_an_undrained_failure() {
    let kernel = LoopbackKernel::new();
    let mut sender: AsyncSender<_, 8> = SenderBuilder::new(&kernel).build();

    sender.send(A, &msg("doomed"), AsynFlags::NOTIFY_ERR).unwrap();
    for i in 1..8 {
        sender.send(Endpoint(100 + i), &msg("fill"), AsynFlags::EMPTY).unwrap();
    }
    kernel.deliver(|dst, _| Some(if dst == A { ErrorCode::EDEADSRCDST } else { ErrorCode::OK }));

    sender.send(B, &msg("after"), AsynFlags::EMPTY).unwrap();
    assert_eq!(kernel.pauses(), 1);
    assert_eq!((sender.first(), sender.next()), (0, 2));
    assert_eq!(sender.slot(0).unwrap().dst, A);
    assert_eq!(sender.slot(1).unwrap().dst, B);
    assert!(sender.slot(2).unwrap().flags.is_empty());
    assert_eq!(kernel.window_len(), 2);

    let record = sender.poll_error().unwrap();
    assert_eq!(record.dst, A);
    assert_eq!(record.result, ErrorCode::EDEADSRCDST);
}

#[test]
fn pending_messages_survive_compaction_in_order() {
    let kernel = LoopbackKernel::new();
    let mut sender: AsyncSender<_, 6> = SenderBuilder::new(&kernel).build();

    for i in 0..6 {
        sender.send(Endpoint(i), &msg("m"), AsynFlags::EMPTY).unwrap();
    }
    // Only even destinations are ready.
    kernel.deliver(|dst, _| (dst.0 % 2 == 0).then_some(ErrorCode::OK));

    // Slot 0 is passed over, 2 and 4 are squeezed out, 1 3 5 move down.
    sender.send(Endpoint(6), &msg("m"), AsynFlags::EMPTY).unwrap();
    assert_eq!(kernel.pauses(), 1);
    assert_eq!((sender.first(), sender.next()), (0, 4));

    sender.send(Endpoint(7), &msg("m"), AsynFlags::EMPTY).unwrap();
    assert_eq!(kernel.pauses(), 1);
    let order: Vec<i32> = (0..sender.next())
        .map(|i| sender.slot(i).unwrap().dst.0)
        .collect();
    assert_eq!(order, vec![1, 3, 5, 6, 7]);
    assert_eq!(sender.outstanding(), 5);
}

#[test]
fn refused_handoff_is_reported_and_the_slot_stays_queued() {
    let kernel = LoopbackKernel::new();
    let mut sender: AsyncSender<_, 8> = SenderBuilder::new(&kernel).build();

    kernel.set_handoff_status(ErrorCode::ELOCKED);
    let err = sender.send(A, &msg("m1"), AsynFlags::EMPTY).unwrap_err();
    assert_eq!(err, AsynError::Handoff(ErrorCode::ELOCKED));
    assert_eq!(err.code(), ErrorCode::ELOCKED);
    assert_eq!(sender.next(), 1);
    assert_eq!(kernel.window_len(), 0);

    kernel.set_handoff_status(ErrorCode::OK);
    sender.send(B, &msg("m2"), AsynFlags::EMPTY).unwrap();
    assert_eq!(kernel.window_len(), 2);
    assert_eq!(deliver_ok(&kernel), 2);
}

#[test]
fn kernel_owned_flags_are_rejected() {
    let kernel = LoopbackKernel::new();
    let mut sender: AsyncSender<_, 8> = SenderBuilder::new(&kernel).build();

    let err = sender.send(A, &msg("x"), AsynFlags::DONE).unwrap_err();
    assert_eq!(err, AsynError::InvalidFlags(AsynFlags::DONE.bits()));
    let err = sender.send(A, &msg("x"), AsynFlags::VALID | AsynFlags::NOTIFY).unwrap_err();
    assert!(matches!(err, AsynError::InvalidFlags(_)));
    assert!(!sender.is_initialized());
    assert_eq!(kernel.handoffs(), 0);

    sender
        .send(A, &msg("x"), AsynFlags::NOTIFY | AsynFlags::NOREPLY | AsynFlags::NOTIFY_ERR)
        .unwrap();
}

#[test]
fn table_is_allocated_lazily_unless_asked() {
    let kernel = LoopbackKernel::new();

    let mut lazy: AsyncSender<_, 8> = SenderBuilder::new(&kernel).build();
    assert!(!lazy.is_initialized());
    assert_eq!(lazy.poll_error(), None);
    assert_eq!((lazy.first(), lazy.next(), lazy.outstanding()), (0, 0, 0));
    assert!(lazy.slot(0).is_none());
    lazy.send(A, &msg("x"), AsynFlags::EMPTY).unwrap();
    assert!(lazy.is_initialized());

    let eager: AsyncSender<_, 8> = SenderBuilder::new(&kernel).with_eager_table(true).build();
    assert!(eager.is_initialized());
    assert_eq!(eager.capacity(), 8);
    assert!(eager.slot(7).unwrap().flags.is_empty());
    assert!(eager.slot(8).is_none());

    let default = AsyncSender::new(&kernel);
    assert_eq!(default.capacity(), asyn_ipc::ASYN::Table::ASYN_NR);
}

#[test]
fn drain_errors_yields_each_failure_once_in_table_order() {
    let kernel = LoopbackKernel::new();
    let mut sender: AsyncSender<_, 8> = SenderBuilder::new(&kernel).build();

    for i in 0..5 {
        sender.send(Endpoint(i), &msg("m"), AsynFlags::NOTIFY_ERR).unwrap();
    }
    kernel.deliver(|dst, _| {
        Some(if dst.0 % 2 == 0 {
            ErrorCode::ENOTREADY
        } else {
            ErrorCode::OK
        })
    });

    let failed: Vec<i32> = sender.drain_errors().map(|r| r.dst.0).collect();
    assert_eq!(failed, vec![0, 2, 4]);
    assert_eq!(sender.drain_errors().count(), 0);
}

#[test]
fn dropping_the_sender_pauses_the_kernel() {
    let kernel = LoopbackKernel::new();
    {
        let mut sender: AsyncSender<_, 8> = SenderBuilder::new(&kernel).build();
        sender.send(A, &msg("in flight"), AsynFlags::EMPTY).unwrap();
        assert_eq!(kernel.window_len(), 1);
    }
    assert_eq!(kernel.window_len(), 0);
    assert_eq!(kernel.pauses(), 1);
    assert_eq!(deliver_ok(&kernel), 0);

    // Never sent, never paused.
    drop(SenderBuilder::<_, 8>::new(&kernel).build());
    assert_eq!(kernel.pauses(), 1);
}

#[test]
fn refused_pause_on_drop_leaks_the_table() {
    let kernel = LoopbackKernel::new();
    {
        let mut sender: AsyncSender<_, 8> = SenderBuilder::new(&kernel).build();
        sender.send(A, &msg("left behind"), AsynFlags::EMPTY).unwrap();
        sender.send(B, &msg("left behind"), AsynFlags::NOTIFY_ERR).unwrap();
        kernel.set_pause_status(ErrorCode::EINVAL);
    }
    assert_eq!(kernel.pauses(), 1);
    assert_eq!(kernel.window_len(), 2);

    // The slots outlive the sender, so the kernel can still finish them.
    let mut seen = Vec::new();
    let delivered = kernel.deliver(|dst, m| {
        seen.push((dst, *m));
        Some(ErrorCode::OK)
    });
    assert_eq!(delivered, 2);
    assert_eq!(seen, vec![(A, msg("left behind")), (B, msg("left behind"))]);
}
