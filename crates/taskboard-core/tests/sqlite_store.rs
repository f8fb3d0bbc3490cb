//! SQLite store integration tests

use taskboard_core::{
    BoardError, BoardService, BoardStore, ContainerId, ItemDraft, NewItem, SequentialIds,
    SqliteStore,
};
use tempfile::TempDir;

fn open(dir: &TempDir) -> BoardService<SqliteStore> {
    let store = SqliteStore::open(dir.path().join("board.db")).unwrap();
    BoardService::new(store).with_id_allocator(SequentialIds::new())
}

fn titles(svc: &BoardService<SqliteStore>, id: ContainerId) -> Vec<String> {
    svc.get_container(id)
        .unwrap()
        .tasks
        .read_ordered()
        .map(|item| format!("{}@{}", item.title, item.position))
        .collect()
}

#[test]
fn test_board_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let board = {
        let svc = open(&dir);
        let board = svc.create_container("Roadmap").unwrap();
        svc.add_item(board.id, NewItem::titled("a")).unwrap();
        svc.add_item(board.id, NewItem::titled("b").at(0)).unwrap();
        board
    };

    let svc = open(&dir);
    assert_eq!(titles(&svc, board.id), vec!["b@0", "a@1"]);
    assert_eq!(svc.get_container(board.id).unwrap().version, 2);
}

#[test]
fn test_move_is_written_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let svc = open(&dir);
    let p1 = svc.create_container("P1").unwrap();
    let p2 = svc.create_container("P2").unwrap();
    svc.add_item(p1.id, NewItem::titled("a")).unwrap();
    let b = svc.add_item(p1.id, NewItem::titled("b")).unwrap().item;
    svc.add_item(p2.id, NewItem::titled("c")).unwrap();

    svc.move_item(b.id, p1.id, p2.id, 0).unwrap();

    assert_eq!(titles(&svc, p1.id), vec!["a@0"]);
    assert_eq!(titles(&svc, p2.id), vec!["b@0", "c@1"]);
    assert_eq!(svc.store().load_item(b.id).unwrap().container_id, p2.id);
}

#[test]
fn test_conflict_in_second_container_rolls_back_first() {
    let dir = tempfile::tempdir().unwrap();
    let svc = open(&dir);
    let p1 = svc.create_container("P1").unwrap();
    let p2 = svc.create_container("P2").unwrap();
    let a = svc.add_item(p1.id, NewItem::titled("a")).unwrap().item;

    let mut source = svc.get_container(p1.id).unwrap();
    let mut stale_destination = svc.get_container(p2.id).unwrap();
    svc.replace_container(p2.id, Some("P2 renamed"), None).unwrap();

    let item = source.tasks.remove(a.id).unwrap();
    stale_destination.tasks.insert(item, Some(0));

    let err = svc
        .store()
        .save_containers(&[&source, &stale_destination])
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(titles(&svc, p1.id), vec!["a@0"]);
    assert!(svc.get_container(p2.id).unwrap().tasks.is_empty());
}

#[test]
fn test_replace_keeps_tie_order_until_reindex() {
    let dir = tempfile::tempdir().unwrap();
    let svc = open(&dir);
    let board = svc.create_container("Board").unwrap();
    let drafts = ["x", "y", "z"]
        .into_iter()
        .map(|title| ItemDraft {
            title: Some(title.to_string()),
            position: Some(1),
            ..Default::default()
        })
        .collect();
    svc.replace_container(board.id, None, Some(drafts)).unwrap();

    assert_eq!(titles(&svc, board.id), vec!["x@1", "y@1", "z@1"]);
    svc.reindex(board.id).unwrap();
    assert_eq!(titles(&svc, board.id), vec!["x@0", "y@1", "z@2"]);
}

#[test]
fn test_out_of_range_positions_are_client_errors() {
    let dir = tempfile::tempdir().unwrap();
    let svc = open(&dir);
    let board = svc.create_container("Board").unwrap();

    let drafts = vec![ItemDraft {
        title: Some("x".to_string()),
        position: Some(usize::MAX),
        ..Default::default()
    }];
    assert!(matches!(
        svc.replace_container(board.id, None, Some(drafts)),
        Err(BoardError::InvalidArgument(_))
    ));

    svc.add_item(board.id, NewItem::titled("a")).unwrap();
    let appended = svc
        .add_item(board.id, NewItem::titled("b").at(usize::MAX))
        .unwrap();
    assert_eq!(appended.item.position, 1);
    assert_eq!(titles(&svc, board.id), vec!["a@0", "b@1"]);
}

#[test]
fn test_delete_removes_items() {
    let dir = tempfile::tempdir().unwrap();
    let svc = open(&dir);
    let board = svc.create_container("Board").unwrap();
    let a = svc.add_item(board.id, NewItem::titled("a")).unwrap().item;

    let removed = svc.delete_container(board.id).unwrap();
    assert_eq!(removed.tasks.len(), 1);
    assert!(matches!(
        svc.get_container(board.id),
        Err(BoardError::NotFound(_))
    ));
    assert!(matches!(
        svc.store().load_item(a.id),
        Err(BoardError::NotFound(_))
    ));

    let next = svc.create_container("Next").unwrap();
    assert_ne!(next.id, board.id);
}

#[test]
fn test_list_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let svc = open(&dir);
    svc.create_container("first").unwrap();
    svc.create_container("second").unwrap();
    let names: Vec<String> = svc
        .list_containers()
        .unwrap()
        .into_iter()
        .map(|c| c.title)
        .collect();
    assert_eq!(names, vec!["second", "first"]);
}
