use crate::client::{Connection, ExecResult, Transaction};
use crate::dialect::Dialect;
use crate::error::OrmError;
use crate::filter::Filter;
use crate::row;
use crate::table::{Column, TableModel};
use crate::testing::ScriptedClient;

static ITEM: TableModel = TableModel::new("public", "item")
    .with_alias("Item")
    .with_columns(&["id", "name"])
    .with_primary_key("id");

#[tokio::test]
async fn run_on_bare_connection_wraps_in_transaction() {
    let client = ScriptedClient::new(Dialect::Postgres);
    let result = ITEM
        .update(vec![Column::with_value("name", "x")])
        .filter(Filter::unit("id", "=", 4))
        .run(&client)
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 1);
    assert_eq!(
        client.events(),
        vec![
            "BEGIN".to_string(),
            r#"PREPARE UPDATE "public"."item" SET "name" = $1 WHERE "id" = $2"#.to_string(),
            r#"EXEC UPDATE "public"."item" SET "name" = $1 WHERE "id" = $2 ['x', 4]"#.to_string(),
            "COMMIT".to_string(),
        ]
    );
}

#[tokio::test]
async fn failed_write_rolls_back() {
    let client = ScriptedClient::new(Dialect::MySql).failing();
    let err = ITEM.delete().run(&client).await.unwrap_err();
    assert!(matches!(err, OrmError::Driver(_)));

    let events = client.events();
    assert_eq!(events.first().map(String::as_str), Some("BEGIN"));
    assert_eq!(events.last().map(String::as_str), Some("ROLLBACK"));
    assert!(!events.iter().any(|e| e == "COMMIT"));
}

#[tokio::test]
async fn run_on_transaction_executes_directly() {
    let client = ScriptedClient::new(Dialect::MySql);
    let tx = client.begin().await.unwrap();
    ITEM.insert(vec![Column::with_value("name", "a")])
        .run(&tx)
        .await
        .unwrap();
    ITEM.insert(vec![Column::with_value("name", "b")])
        .run(&tx)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let events = client.events();
    assert_eq!(events.iter().filter(|e| *e == "BEGIN").count(), 1);
    assert_eq!(events.iter().filter(|e| *e == "COMMIT").count(), 1);
    assert_eq!(events.iter().filter(|e| e.starts_with("EXEC")).count(), 2);
}

#[tokio::test]
async fn transaction_macro_commits_and_rolls_back() {
    async fn batch(client: &ScriptedClient, fail: bool) -> crate::OrmResult<u64> {
        crate::transaction!(client, tx, {
            let r = ITEM.delete().run(&tx).await?;
            if fail {
                return Err(OrmError::Other("stop".to_string()));
            }
            Ok(r.rows_affected)
        })
    }

    let client = ScriptedClient::new(Dialect::MySql);
    assert_eq!(batch(&client, false).await.unwrap(), 1);
    assert_eq!(client.events().last().map(String::as_str), Some("COMMIT"));

    let client = ScriptedClient::new(Dialect::MySql);
    assert!(batch(&client, true).await.is_err());
    assert_eq!(client.events().last().map(String::as_str), Some("ROLLBACK"));
}

#[tokio::test]
async fn select_list_stops_when_visitor_returns_false() {
    let client =
        ScriptedClient::new(Dialect::MySql).with_rows(&[&["1", "a"], &["2", "b"], &["3", "c"]]);
    let mut ids = Vec::new();
    let visited = ITEM
        .select(&[])
        .select_list(&client, |columns, cells| {
            assert_eq!(columns.len(), 2);
            ids.push(row::as_int64(&cells[0]));
            ids.len() < 2
        })
        .await
        .unwrap();
    assert_eq!(visited, 2);
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(client.events().last().map(String::as_str), Some("VISITED 2"));
}

#[tokio::test]
async fn select_one_exactly_one_row() {
    let client = ScriptedClient::new(Dialect::Postgres).with_rows(&[&["7", "seven"]]);
    let mut name = String::new();
    ITEM.select(&[])
        .filter(Filter::unit("id", "=", 7))
        .select_one(&client, |_, cells| name = row::as_string(&cells[1]))
        .await
        .unwrap();
    assert_eq!(name, "seven");
}

#[tokio::test]
async fn select_one_without_rows() {
    let client = ScriptedClient::new(Dialect::Postgres);
    let err = ITEM
        .select(&[])
        .select_one(&client, |_, _| {})
        .await
        .unwrap_err();
    assert!(err.is_no_rows());
}

#[tokio::test]
async fn select_one_stops_after_second_row() {
    let client =
        ScriptedClient::new(Dialect::Postgres).with_rows(&[&["1", "a"], &["2", "b"], &["3", "c"]]);
    let mut calls = 0;
    let err = ITEM
        .select(&[])
        .select_one(&client, |_, _| calls += 1)
        .await
        .unwrap_err();
    assert!(err.is_multiple_rows());
    assert_eq!(calls, 1);
    assert_eq!(client.events().last().map(String::as_str), Some("VISITED 2"));
}

#[tokio::test]
async fn build_errors_do_no_io() {
    let client = ScriptedClient::new(Dialect::MySql);
    let err = ITEM.insert(Vec::new()).run(&client).await.unwrap_err();
    assert!(matches!(err, OrmError::NotEnoughColumns(_)));
    assert!(client.events().is_empty());
}

#[tokio::test]
async fn wrong_kind_is_not_supported() {
    let client = ScriptedClient::new(Dialect::MySql);
    let err = ITEM.select(&[]).run(&client).await.unwrap_err();
    assert!(matches!(err, OrmError::NotSupportedCall(_)));

    let err = ITEM
        .delete()
        .select_list(&client, |_, _| true)
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::NotSupportedCall(_)));
    assert!(client.events().is_empty());
}

#[tokio::test]
async fn exec_result_is_passed_through() {
    let client = ScriptedClient::new(Dialect::MySql).with_exec_result(ExecResult {
        rows_affected: 1,
        last_insert_id: Some(99),
    });
    let result = ITEM
        .insert(vec![Column::with_value("name", "z")])
        .run(&client)
        .await
        .unwrap();
    assert_eq!(result.last_insert_id, Some(99));
}
