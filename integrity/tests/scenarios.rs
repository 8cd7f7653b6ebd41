//! End-to-end scenarios through the validated store

use relstore_core::{fields, Value, ViewDefinition};
use relstore_integrity::{DisplaySpec, Store, TableMetadata};
use rstest::{fixture, rstest};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[fixture]
fn chess() -> Store {
    init_logging();
    let mut store = Store::new();
    store.define_table("players", &["id", "first", "last"], &[]).unwrap();
    store
        .define_table("games", &["id", "player1_id", "player2_id", "result"], &[])
        .unwrap();
    store.define_table("moves", &["id", "game_id", "san"], &[]).unwrap();

    store
        .define_metadata(
            "players",
            TableMetadata::new()
                .display(DisplaySpec::composite(&["first", "last"], " "))
                .child("games"),
        )
        .unwrap();
    store
        .define_metadata(
            "games",
            TableMetadata::new()
                .foreign_key("player1_id", "players")
                .foreign_key("player2_id", "players")
                .child("moves"),
        )
        .unwrap();
    store
        .define_metadata("moves", TableMetadata::new().foreign_key("game_id", "games"))
        .unwrap();

    for (first, last) in [("Ada", "Byron"), ("Bo", "Chen"), ("Cy", "Dahl"), ("Di", "Eng"), ("Ed", "Fox")] {
        store
            .create("players", &fields! { "first" => first, "last" => last })
            .unwrap();
    }
    store
}

#[rstest]
fn deleting_a_player_removes_their_games_and_moves(mut chess: Store) {
    let g1 = chess.create("games", &fields! { "player1_id" => 5, "player2_id" => 1 }).unwrap();
    let g2 = chess.create("games", &fields! { "player1_id" => 5, "player2_id" => 2 }).unwrap();
    let g3 = chess.create("games", &fields! { "player1_id" => 3, "player2_id" => 4 }).unwrap();
    chess.create("moves", &fields! { "game_id" => g1, "san" => "e4" }).unwrap();
    chess.create("moves", &fields! { "game_id" => g3, "san" => "d4" }).unwrap();

    let report = chess.delete("players", 5).unwrap();
    assert_eq!(report.len(), 4);
    assert_eq!(report.deleted.last(), Some(&("tbl_players".to_string(), 5)));
    assert_eq!(report.deleted[0], ("tbl_moves".to_string(), 1));
    assert!(report.removed("tbl_games", g1));
    assert!(report.removed("tbl_games", g2));

    let games = chess.read_all("games").unwrap();
    assert_eq!(games.iter().map(|g| g.id()).collect::<Vec<_>>(), vec![g3]);
    assert_eq!(chess.read_all("moves").unwrap().len(), 1);
    assert!(chess.get("players", 5).unwrap().is_none());
}

#[rstest]
fn reference_to_missing_row_is_rejected(mut chess: Store) {
    let err = chess.create("games", &fields! { "player1_id" => 999 }).unwrap_err();
    assert!(err.is_foreign_key_violation());
    assert!(err.to_string().contains("999"));
    assert!(chess.read_all("games").unwrap().is_empty());
}

#[rstest]
fn null_references_are_allowed(mut chess: Store) {
    let id = chess.create("games", &fields! { "player1_id" => 1 }).unwrap();
    let game = chess.get("games", id).unwrap().unwrap();
    assert_eq!(game.get(2), Some(&Value::Null));
}

#[rstest]
fn display_labels_follow_references(mut chess: Store) {
    let id = chess
        .create("games", &fields! { "player1_id" => 1, "player2_id" => 2, "result" => "1-0" })
        .unwrap();
    let game = chess.get("tbl_games", id).unwrap().unwrap();
    let display = chess.resolve_display("games", &game).unwrap();

    assert_eq!(display.labels["player1_id"], "Ada Byron");
    assert_eq!(display.labels["player2_id"], "Bo Chen");
    assert_eq!(display.fields["result"], Value::from("1-0"));
    assert_eq!(display.display, None);
}

#[rstest]
fn join_view_pairs_games_with_players(mut chess: Store) {
    chess.create("games", &fields! { "player1_id" => 2, "result" => "0-1" }).unwrap();
    chess.create("games", &fields! { "player1_id" => 4, "result" => "1-0" }).unwrap();
    chess
        .define_view(
            "white_players",
            ViewDefinition::from_table("games").join("players", "player1_id", "id"),
        )
        .unwrap();

    let data = chess.get_data("white_players").unwrap();
    assert_eq!(
        data.columns,
        vec!["id", "player1_id", "player2_id", "result", "players.first", "players.last"]
    );
    assert_eq!(data.len(), 2);
    assert_eq!(data.value(0, "players.first"), Some(&Value::from("Bo")));
    assert_eq!(data.value(1, "players.last"), Some(&Value::from("Eng")));

    chess.delete("players", 4).unwrap();
    assert_eq!(chess.get_data("white_players").unwrap().len(), 1);
}

#[test]
fn mutual_references_terminate() {
    init_logging();
    let mut store = Store::new();
    store.define_table("a", &["id", "b_id"], &[]).unwrap();
    store.define_table("b", &["id", "a_id"], &[]).unwrap();
    store.define_metadata("a", TableMetadata::new().foreign_key("b_id", "b")).unwrap();
    store.define_metadata("b", TableMetadata::new().foreign_key("a_id", "a")).unwrap();

    let a = store.create("a", &fields! {}).unwrap();
    let b = store.create("b", &fields! { "a_id" => a }).unwrap();
    assert!(store.update("a", a, &fields! { "b_id" => b }).unwrap());

    let report = store.delete("a", a).unwrap();
    assert_eq!(report.deleted, vec![("tbl_b".to_string(), b), ("tbl_a".to_string(), a)]);
    assert!(store.read_all("a").unwrap().is_empty());
    assert!(store.read_all("b").unwrap().is_empty());
}

#[test]
fn composite_unique_constraint_through_store() {
    init_logging();
    let mut store = Store::new();
    store.define_table("points", &["id", "x", "y"], &[vec!["x", "y"]]).unwrap();

    let first = store.create("points", &fields! { "x" => 1, "y" => 2 }).unwrap();
    let err = store.create("points", &fields! { "x" => 1, "y" => 2 }).unwrap_err();
    assert!(err.is_unique_violation());

    let second = store.create("points", &fields! { "x" => 1, "y" => 3 }).unwrap();
    assert_eq!(second, first + 1);
    assert!(store.update("points", second, &fields! { "y" => 2 }).is_err());
    assert_eq!(store.get("points", second).unwrap().unwrap().get(2), Some(&Value::Integer(3)));
    assert!(store.update("points", first, &fields! { "x" => 1, "y" => 2 }).unwrap());
}

#[test]
fn natural_primary_keys_are_followed() {
    init_logging();
    let mut store = Store::new();
    store.define_table("teams", &["id", "code", "name"], &[vec!["code"]]).unwrap();
    store.define_table("fixtures", &["id", "home", "away"], &[]).unwrap();
    store
        .define_metadata(
            "teams",
            TableMetadata::new().primary_key("code").display(DisplaySpec::field("name")),
        )
        .unwrap();
    store
        .define_metadata(
            "fixtures",
            TableMetadata::new().foreign_key("home", "teams").foreign_key("away", "teams"),
        )
        .unwrap();

    store.create("teams", &fields! { "code" => "OSL", "name" => "Oslo" }).unwrap();
    let bergen = store.create("teams", &fields! { "code" => "BGO", "name" => "Bergen" }).unwrap();
    let fixture = store.create("fixtures", &fields! { "home" => "OSL", "away" => "BGO" }).unwrap();
    assert!(store.create("fixtures", &fields! { "home" => "TRD" }).is_err());

    let row = store.get("fixtures", fixture).unwrap().unwrap();
    let display = store.resolve_display("fixtures", &row).unwrap();
    assert_eq!(display.labels["away"], "Bergen");

    let report = store.delete("teams", bergen).unwrap();
    assert_eq!(report.len(), 2);
    assert!(store.read_all("fixtures").unwrap().is_empty());
}

#[test]
fn import_runs_through_validation() {
    init_logging();
    let mut store = Store::new();
    store.define_table("players", &["id", "name"], &[vec!["name"]]).unwrap();
    store.define_table("games", &["id", "player1_id"], &[]).unwrap();
    store
        .define_metadata("games", TableMetadata::new().foreign_key("player1_id", "players"))
        .unwrap();

    let report = store
        .import("# roster\nplayers|name\nAda\nBo\n\ngames|player1_id\n2\n1\n")
        .unwrap();
    assert_eq!(report.ids_for("players"), vec![1, 2]);
    assert_eq!(report.ids_for("games"), vec![1, 2]);

    assert!(store.import("players|name\nAda\n").unwrap_err().is_unique_violation());
    assert!(store.import("players|name|rating\nZed\n").is_err());
}
