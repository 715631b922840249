use std::fs::{self, File};
use tempfile::tempdir;

use file_harmony::config::Config;
use file_harmony::models::ItemKind;
use file_harmony::tree::SelectionTree;

#[test]
fn custom_extensions_and_multiple_roots() {
    let td = tempdir().unwrap();
    let a = td.path().join("a");
    let b = td.path().join("b");
    fs::create_dir_all(&a).unwrap();
    fs::create_dir_all(&b).unwrap();
    File::create(a.join("x.ogg")).unwrap();
    File::create(a.join("y.mp3")).unwrap();
    File::create(b.join("z.ogg")).unwrap();

    let cfg: Config = toml::from_str("file_extensions = [\"*.ogg\"]").unwrap();
    let tree = SelectionTree::scan(&[a.clone(), b.clone(), a.clone()], &cfg);

    // duplicate root is ignored
    assert_eq!(tree.roots().len(), 2);
    let files: Vec<_> = tree.iter().filter(|(_, i)| i.kind == ItemKind::File).map(|(_, i)| i.path.clone()).collect();
    assert_eq!(files, vec![a.join("x.ogg"), b.join("z.ogg")]);
}

#[cfg(unix)]
#[test]
fn unreadable_folder_is_reported_and_omitted() {
    use std::os::unix::fs::PermissionsExt;

    let td = tempdir().unwrap();
    let root = td.path().to_path_buf();
    let locked = root.join("locked");
    fs::create_dir_all(&locked).unwrap();
    File::create(locked.join("hidden.mp3")).unwrap();
    File::create(root.join("open.mp3")).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // privileged users can still list it; nothing to check then
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let tree = SelectionTree::scan(&[root.clone()], &Config::default());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(tree.find(&locked).is_none());
    assert!(tree.find(&locked.join("hidden.mp3")).is_none());
    assert!(tree.find(&root.join("open.mp3")).is_some());
    assert!(tree.errors().iter().any(|e| e.path == locked));
}
