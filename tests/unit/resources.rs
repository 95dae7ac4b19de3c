use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target")
        .join("unit_resources")
        .join(format!("{name}-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn release_all_runs_in_reverse_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut rm = ResourceManager::new();
    for i in 0..3 {
        let order = order.clone();
        rm.register_fn(format!("r{i}"), move || {
            order.lock().unwrap().push(i);
            Ok(())
        });
    }
    assert_eq!(rm.pending(), 3);
    assert!(rm.release_all().is_empty());
    assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
    assert_eq!(rm.pending(), 0);
}

#[test]
fn failing_release_does_not_block_the_rest() {
    let ran = Arc::new(AtomicUsize::new(0));
    let mut rm = ResourceManager::new();
    {
        let ran = ran.clone();
        rm.register_fn("first", move || {
            ran.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }
    rm.register_fn("broken", || Err(NarrationError::render("boom")));
    {
        let ran = ran.clone();
        rm.register_fn("last", move || {
            ran.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }

    let failures = rm.release_all();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].label, "broken");
    assert_eq!(ran.load(Ordering::SeqCst), 2);
}

#[test]
fn release_is_idempotent() {
    let ran = Arc::new(AtomicUsize::new(0));
    let mut rm = ResourceManager::new();
    let id = {
        let ran = ran.clone();
        rm.register_fn("once", move || {
            ran.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    };
    rm.release(id).unwrap();
    rm.release(id).unwrap();
    assert!(rm.release_all().is_empty());
    assert!(rm.release_all().is_empty());
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[test]
fn files_and_dirs_are_removed_and_missing_ones_are_fine() {
    let dir = scratch_dir("files");
    let file = dir.join("seg-0.mp3");
    std::fs::write(&file, b"abc").unwrap();

    let mut rm = ResourceManager::new();
    rm.register_dir("run dir", &dir);
    rm.register_file("audio", &file);
    rm.register_file("never created", &dir.join("missing.mp3"));

    assert!(rm.release_all().is_empty());
    assert!(!file.exists());
    assert!(!dir.exists());
}

#[test]
fn drop_releases_pending_resources() {
    let dir = scratch_dir("drop");
    let file = dir.join("tmp.bin");
    std::fs::write(&file, b"x").unwrap();
    {
        let mut rm = ResourceManager::new();
        rm.register_dir("run dir", &dir);
    }
    assert!(!dir.exists());
}

#[test]
fn dismissed_resources_are_kept() {
    let dir = scratch_dir("dismiss");
    let file = dir.join("keep.bin");
    std::fs::write(&file, b"x").unwrap();
    let mut rm = ResourceManager::new();
    let id = rm.register_file("kept", &file);
    assert!(rm.dismiss(id));
    assert!(!rm.dismiss(id));
    assert_eq!(rm.pending(), 0);
    assert!(rm.release_all().is_empty());
    assert!(file.exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[cfg(unix)]
#[test]
fn clip_handles_report_closed_after_release() {
    let child = std::process::Command::new("sleep")
        .arg("30")
        .spawn()
        .unwrap();
    let clip = ClipHandle::new("sleeper", child);
    let mut rm = ResourceManager::new();
    rm.register_clip(&clip);
    assert!(!clip.is_closed());

    assert!(rm.release_all().is_empty());
    assert!(clip.is_closed());
    clip.close().unwrap();
    assert_eq!(clip.wait().unwrap(), None);
}
