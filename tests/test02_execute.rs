use sql_middleware_oracle::oracle::SessionTags;
use sql_middleware_oracle::prelude::*;
use sql_middleware_oracle::test_utils::{MockReply, mock_pool, test_options};

const INSERT_SQL: &str = "insert into regions (region_name) values (:1) returning region_id into :2";
const SELECT_SQL: &str = "select region_id, region_name from regions";

fn regions_reply() -> MockReply {
    MockReply::rows(
        &[("REGION_ID", 2002, 2), ("REGION_NAME", 2001, 1)],
        vec![
            vec![RowValues::Int(1), RowValues::Text("Europe".into())],
            vec![RowValues::Int(2), RowValues::Text("Americas".into())],
        ],
    )
}

#[tokio::test]
async fn returning_single_value_is_scalar() -> Result<(), OracleMiddlewareError> {
    let (pool, db) = mock_pool(test_options())?;
    db.reply(INSERT_SQL, MockReply::affected(1));
    db.returning("region_id", vec![RowValues::Int(5)]);

    let mut conn = pool.get_connection().await?;
    let params = Params::positional(vec![RowValues::Text("Asia".into())]);
    let result = conn
        .query(INSERT_SQL)
        .params(&params)
        .returning("region_id", "number")
        .execute()
        .await?;

    assert_eq!(result.rows_affected, Some(1));
    assert_eq!(
        result.returned("region_id"),
        Some(&ReturnValue::Scalar(RowValues::Int(5)))
    );
    // the caller's params are not extended
    assert_eq!(params.len(), 1);

    let stats = db.stats();
    let sent = &stats.user_statements()[0].params;
    assert_eq!(sent.len(), 2);
    conn.close().await?;
    Ok(())
}

#[tokio::test]
async fn returning_many_values_is_list() -> Result<(), OracleMiddlewareError> {
    let (pool, db) = mock_pool(test_options())?;
    let sql = "update regions set region_name = upper(region_name) returning region_id into :ids";
    db.reply(sql, MockReply::affected(3));
    db.returning(
        "returning$ids",
        vec![RowValues::Int(1), RowValues::Int(2), RowValues::Int(3)],
    );

    let mut conn = pool.get_connection().await?;
    let result = conn
        .query(sql)
        .returning("returning$ids", "number")
        .execute()
        .await?;
    assert_eq!(
        result.returned("ids").and_then(ReturnValue::as_list),
        Some(&[RowValues::Int(1), RowValues::Int(2), RowValues::Int(3)][..])
    );
    conn.close().await?;
    Ok(())
}

#[tokio::test]
async fn synthetic_row_number_is_hidden() -> Result<(), OracleMiddlewareError> {
    let (pool, db) = mock_pool(test_options())?;
    db.reply(
        SELECT_SQL,
        MockReply::rows(
            &[
                ("ROW$NUMBER", 2002, 2),
                ("REGION_ID", 2002, 2),
                ("REGION_NAME", 2001, 96),
            ],
            vec![vec![
                RowValues::Int(1),
                RowValues::Int(10),
                RowValues::Text("Europe".into()),
            ]],
        ),
    );
    let mut conn = pool.get_connection().await?;

    let result = conn
        .execute(SELECT_SQL, &Params::default(), &ExecuteOptions::default())
        .await?;
    let fields = result.fields.as_ref().expect("fields");
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["REGION_ID", "REGION_NAME"]);
    assert_eq!(fields[1].index, 1);
    assert!(fields[1].fixed_length);
    assert_eq!(fields[0].data_type, Some(LogicalType::Number));
    assert_eq!(
        result.rows,
        Some(vec![Row::Array(vec![
            RowValues::Int(10),
            RowValues::Text("Europe".into())
        ])])
    );

    let result = conn
        .query(SELECT_SQL)
        .object_rows(true)
        .naming(FieldNaming::Lowercase)
        .execute()
        .await?;
    assert_eq!(result.field("region_name").map(|f| f.index), Some(1));
    let row = &result.rows.as_ref().expect("rows")[0];
    assert_eq!(row.len(), 2);
    assert_eq!(row.get("region_id"), Some(&RowValues::Int(10)));
    assert_eq!(row.get("row$number"), None);
    conn.close().await?;
    Ok(())
}

#[tokio::test]
async fn fetch_rows_limits_plain_queries() -> Result<(), OracleMiddlewareError> {
    let (pool, db) = mock_pool(test_options())?;
    db.reply(SELECT_SQL, regions_reply());
    let mut conn = pool.get_connection().await?;

    let result = conn.query(SELECT_SQL).fetch_rows(1).execute().await?;
    assert_eq!(result.rows.map(|r| r.len()), Some(1));
    let stats = db.stats();
    let options = &stats.user_statements()[0].options;
    assert_eq!(options.max_rows, Some(1));
    assert_eq!(options.prefetch_rows, None);
    conn.close().await?;
    Ok(())
}

#[tokio::test]
async fn transaction_flag_follows_auto_commit() -> Result<(), OracleMiddlewareError> {
    let (pool, db) = mock_pool(test_options())?;
    db.reply(INSERT_SQL, MockReply::affected(1));
    let mut conn = pool.get_connection().await?;

    conn.start_transaction();
    conn.execute(INSERT_SQL, &Params::default(), &ExecuteOptions::default())
        .await?;
    assert!(conn.in_transaction());
    assert!(!db.stats().user_statements()[0].options.auto_commit);

    conn.commit().await?;
    assert!(!conn.in_transaction());

    conn.start_transaction();
    conn.query(INSERT_SQL).auto_commit(true).execute().await?;
    assert!(!conn.in_transaction());

    conn.start_transaction();
    conn.rollback().await?;
    assert!(!conn.in_transaction());

    // forwarded even with no transaction open
    conn.commit().await?;
    let stats = db.stats();
    assert_eq!(stats.commits, 2);
    assert_eq!(stats.rollbacks, 1);
    conn.close().await?;
    Ok(())
}

#[tokio::test]
async fn session_tags_are_written_on_every_execute() -> Result<(), OracleMiddlewareError> {
    let (pool, db) = mock_pool(test_options())?;
    let mut conn = pool.get_connection().await?;

    conn.query("select 1 from dual")
        .action("report")
        .client_id("u-17")
        .module("billing")
        .execute()
        .await?;
    conn.test().await?;

    let stats = db.stats();
    let statements = stats.user_statements();
    assert_eq!(statements[0].tags.action, "report");
    assert_eq!(statements[0].tags.client_id, "u-17");
    assert_eq!(statements[0].tags.module, "billing");
    assert_eq!(statements[1].tags, SessionTags::default());
    conn.close().await?;
    Ok(())
}

#[tokio::test]
async fn closed_connection_rejects_statements() -> Result<(), OracleMiddlewareError> {
    let (pool, db) = mock_pool(test_options())?;
    let mut conn = pool.get_connection().await?;
    conn.close().await?;
    conn.close().await?;
    assert!(conn.is_closed());
    assert_eq!(db.stats().sessions_closed, 1);

    let before = db.stats().executed.len();
    assert!(matches!(
        conn.test().await,
        Err(OracleMiddlewareError::ClosedConnection)
    ));
    assert!(matches!(
        conn.commit().await,
        Err(OracleMiddlewareError::ClosedConnection)
    ));
    assert!(matches!(
        conn.rollback().await,
        Err(OracleMiddlewareError::ClosedConnection)
    ));
    assert_eq!(db.stats().executed.len(), before);
    Ok(())
}

#[tokio::test]
async fn native_errors_carry_the_statement() -> Result<(), OracleMiddlewareError> {
    let (pool, db) = mock_pool(test_options())?;
    let sql = "select * from missing_table";
    db.reply(
        sql,
        MockReply::error(NativeError::with_code(942, "table or view does not exist")),
    );
    let mut conn = pool.get_connection().await?;

    let params = Params::named([("id", RowValues::Int(3))]);
    let err = conn
        .query(sql)
        .params(&params)
        .execute()
        .await
        .expect_err("statement should fail");
    assert_eq!(err.native().and_then(|n| n.code), Some(942));
    let statement = err.statement().expect("statement context");
    assert_eq!(statement.sql, sql);
    assert_eq!(statement.params, params);
    assert!(err.to_string().starts_with("ORA-00942: table or view does not exist"));
    conn.close().await?;
    Ok(())
}

#[tokio::test]
async fn close_rolls_back_only_open_transactions() -> Result<(), OracleMiddlewareError> {
    let (pool, db) = mock_pool(test_options())?;
    db.reply(INSERT_SQL, MockReply::affected(1));

    let mut conn = pool.get_connection().await?;
    conn.execute(INSERT_SQL, &Params::default(), &ExecuteOptions::default())
        .await?;
    conn.close().await?;
    assert_eq!(db.stats().rollbacks, 0);

    let mut conn = pool.get_connection().await?;
    conn.start_transaction();
    conn.execute(INSERT_SQL, &Params::default(), &ExecuteOptions::default())
        .await?;
    conn.close().await?;
    conn.close().await?;

    let stats = db.stats();
    assert_eq!(stats.rollbacks, 1);
    assert_eq!(stats.sessions_closed, 2);
    Ok(())
}

#[tokio::test]
async fn extended_metadata_is_requested_by_default() -> Result<(), OracleMiddlewareError> {
    let (pool, db) = mock_pool(test_options())?;
    db.reply(SELECT_SQL, regions_reply());
    let mut conn = pool.get_connection().await?;

    conn.query(SELECT_SQL).execute().await?;
    conn.query(SELECT_SQL).extended_metadata(false).execute().await?;

    let stats = db.stats();
    let statements = stats.user_statements();
    assert!(statements[0].options.extended_metadata);
    assert!(!statements[1].options.extended_metadata);
    conn.close().await?;
    Ok(())
}
