use casics_common::path::CwdGuard;

// Changing the working directory affects the whole process, so this file
// holds a single test.
#[test]
fn cwd_guard_restores_directory_on_drop() {
    let original = std::env::current_dir().expect("current dir");
    let target = tempfile::tempdir().expect("tempdir");
    {
        let guard = CwdGuard::new().expect("guard");
        assert_eq!(guard.saved(), original.as_path());
        std::env::set_current_dir(target.path()).expect("chdir");
        assert_ne!(std::env::current_dir().unwrap(), original);
    }
    assert_eq!(std::env::current_dir().unwrap(), original);
}
