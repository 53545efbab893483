use qlaunch_core::candidate_store::CandidateStore;
use qlaunch_core::discovery::{
    CandidateEnumerator, DiscoveredEntry, FixedProvider, PathDiscoveryProvider, ProviderError,
    UnavailableProvider,
};

#[test]
fn fixed_provider_is_deterministic() {
    let provider = FixedProvider::from_names(["firefox", "find"]);
    let entries = provider.enumerate().unwrap();

    assert_eq!(provider.provider_name(), "fixed");
    assert_eq!(
        entries,
        vec![
            DiscoveredEntry::executable("firefox"),
            DiscoveredEntry::executable("find"),
        ]
    );
}

#[test]
fn store_skips_non_executable_entries() {
    let provider = FixedProvider::from_entries(vec![
        DiscoveredEntry::executable("ls"),
        DiscoveredEntry {
            name: "README".to_string(),
            is_executable: false,
        },
        DiscoveredEntry::executable("cat"),
    ]);

    let store = CandidateStore::load(&provider, 16);
    assert_eq!(store.names(), ["ls", "cat"]);
}

#[test]
fn enumeration_error_yields_empty_store() {
    let provider = UnavailableProvider::new(ProviderError::new("PATH is not set"));
    let store = CandidateStore::load(&provider, 16);
    assert!(store.is_empty());
}

#[test]
fn missing_search_dirs_contribute_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let provider = PathDiscoveryProvider::new(vec![
        dir.path().join("does-not-exist"),
        std::path::PathBuf::new(),
    ]);

    let entries = provider.enumerate().unwrap();
    assert!(entries.is_empty());
}

#[cfg(unix)]
mod unix {
    use std::os::unix::fs::{symlink, PermissionsExt};
    use std::path::Path;

    use qlaunch_core::candidate_store::CandidateStore;
    use qlaunch_core::discovery::{is_executable, CandidateEnumerator, PathDiscoveryProvider};

    fn write_file(path: &Path, mode: u32) {
        std::fs::write(path, b"#!/bin/sh\n").unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn executable_bit_and_regular_file_are_required() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("tool");
        let data = dir.path().join("data");
        write_file(&tool, 0o755);
        write_file(&data, 0o644);

        assert!(is_executable(&tool));
        assert!(!is_executable(&data));
        assert!(!is_executable(dir.path()));
    }

    #[test]
    fn path_scan_keeps_executables_and_symlinks_to_them() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("tool"), 0o755);
        write_file(&dir.path().join("notes.txt"), 0o644);
        std::fs::create_dir(dir.path().join("subdir")).unwrap();
        symlink(dir.path().join("tool"), dir.path().join("tool-link")).unwrap();
        symlink(dir.path().join("notes.txt"), dir.path().join("notes-link")).unwrap();
        symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

        let provider = PathDiscoveryProvider::new(vec![dir.path().to_path_buf()]);
        let store = CandidateStore::load(&provider, 64);

        let mut names: Vec<&str> = store.iter().collect();
        names.sort();
        assert_eq!(names, ["tool", "tool-link"]);
    }

    #[test]
    fn earlier_search_dir_wins_on_duplicate_names() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_file(&first.path().join("vim"), 0o755);
        write_file(&second.path().join("vim"), 0o755);
        write_file(&second.path().join("zsh"), 0o755);

        let provider = PathDiscoveryProvider::new(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        let entries = provider.enumerate().unwrap();
        assert_eq!(entries.len(), 3);

        let store = CandidateStore::load(&provider, 64);
        assert_eq!(store.names(), ["vim", "zsh"]);
    }

    #[test]
    fn scan_stops_at_capacity() {
        let dir = tempfile::tempdir().unwrap();
        for index in 0..10 {
            write_file(&dir.path().join(format!("tool{index}")), 0o700);
        }

        let provider = PathDiscoveryProvider::new(vec![dir.path().to_path_buf()]);
        let store = CandidateStore::load(&provider, 4);
        assert_eq!(store.len(), 4);
    }
}
