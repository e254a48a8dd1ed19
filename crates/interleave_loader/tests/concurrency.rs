use {
    interleave_core::{FormatVersion, Insn, MethodNode, UnitNode},
    interleave_loader::*,
    std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            mpsc, Arc, Barrier, Mutex,
        },
        thread,
        time::Duration,
    },
};

const THREADS: usize = 8;

fn source(names: &[&str]) -> Arc<MemorySource> {
    let source = MemorySource::new();
    for name in names {
        source
            .insert_unit(
                &UnitNode::new(FormatVersion::V1_8, *name)
                    .method(MethodNode::new("run", vec![Insn::Return])),
            )
            .unwrap();
    }
    Arc::new(source)
}

#[test]
fn concurrent_loads_of_one_name_rewrite_once() {
    let rewrites = Arc::new(AtomicUsize::new(0));
    let source = source(&["pkg/Shared"]);
    let loader = InstrumentationLoader::builder(Arc::clone(&source), PassthroughLoader::new(source))
        .pass({
            let rewrites = Arc::clone(&rewrites);
            move |unit: UnitNode| -> Result<UnitNode, PassError> {
                rewrites.fetch_add(1, Ordering::SeqCst);
                // Widen the window in which other threads could race the first load.
                thread::sleep(Duration::from_millis(50));
                Ok(unit)
            }
        })
        .build();

    let barrier = Barrier::new(THREADS);
    let artifacts: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    loader.load("pkg.Shared").unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(rewrites.load(Ordering::SeqCst), 1);
    for artifact in &artifacts[1..] {
        assert!(Arc::ptr_eq(&artifacts[0], artifact));
    }
    assert_eq!(loader.cached_len(), 1);
}

#[test]
fn slow_load_does_not_block_other_names() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let entered_tx = Mutex::new(entered_tx);
    let release_rx = Mutex::new(release_rx);

    let source = source(&["pkg/Slow", "pkg/Fast"]);
    let loader = InstrumentationLoader::builder(Arc::clone(&source), PassthroughLoader::new(source))
        .pass(move |unit: UnitNode| -> Result<UnitNode, PassError> {
            if unit.name == "pkg/Slow" {
                entered_tx.lock().unwrap().send(())?;
                release_rx
                    .lock()
                    .unwrap()
                    .recv_timeout(Duration::from_secs(10))?;
            }
            Ok(unit)
        })
        .build();

    thread::scope(|s| {
        let slow = s.spawn(|| loader.load("pkg.Slow"));
        entered_rx.recv_timeout(Duration::from_secs(10)).unwrap();

        // The slow rewrite is parked inside its critical section.
        assert!(loader.cache().get(&"pkg.Slow".into()).is_none());
        let fast = loader.load("pkg.Fast").unwrap();
        assert_eq!(fast.name().as_str(), "pkg.Fast");
        assert!(loader.cache().get(&"pkg.Slow".into()).is_none());

        release_tx.send(()).unwrap();
        // Fails if the fast load had to wait for the slow one to time out.
        assert!(slow.join().unwrap().is_ok());
    });
    assert_eq!(loader.cached_len(), 2);
}

#[test]
fn failed_load_can_be_retried_by_later_callers() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let source = source(&["pkg/Flaky"]);
    let loader = InstrumentationLoader::builder(Arc::clone(&source), PassthroughLoader::new(source))
        .pass({
            let attempts = Arc::clone(&attempts);
            move |unit: UnitNode| -> Result<UnitNode, PassError> {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err("first attempt fails".into());
                }
                Ok(unit)
            }
        })
        .build();

    assert!(matches!(
        loader.load("pkg.Flaky"),
        Err(LoadError::Instrumentation {
            source: InstrumentError::Pass { .. },
            ..
        })
    ));
    assert!(loader.load("pkg.Flaky").is_ok());
    assert!(loader.load("pkg.Flaky").is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}
