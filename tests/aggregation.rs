mod helpers;

use helpers::data::fixtures;
use helpers::init_debug_for_tests;
use rust_decimal::Decimal;
use tabula::exec::aggregate::concat;
use tabula::exec::table::DisplayRow;
use tabula::{AggregationMethod, Params, QueryError, Value};

fn column(rows: &[DisplayRow], name: &str) -> Vec<Value> {
    rows.iter()
        .map(|r| r.get(name).cloned().unwrap_or(Value::Null))
        .collect()
}

#[test]
fn concat_drops_empties_and_sorts() {
    let v = concat(&[Value::Int64(3), Value::from("1"), Value::from("2"), Value::Null]);
    assert_eq!(v, Value::from("1, 2, 3"));
    assert_eq!(concat(&[Value::Int64(1)]), Value::from("1"));
    assert_eq!(concat(&[Value::from(""), Value::Null]), Value::from(""));
}

#[test]
fn concat_table() {
    init_debug_for_tests();
    let f = fixtures();
    let item = f.sales.field("item_id").unwrap();
    let customer = f.sales.field("customer_id").unwrap();

    let rows = f
        .sales
        .pivot(&[item], &[(customer, AggregationMethod::by_name("concat").unwrap())])
        .unwrap()
        .all(&Params::new())
        .unwrap();

    let names: Vec<_> = rows[0].keys().cloned().collect();
    assert_eq!(names, vec!["Item ID", "Customer ID"]);
    assert_eq!(
        column(&rows, "Item ID"),
        vec![Value::Null, Value::Int64(1), Value::Int64(2)]
    );
    assert_eq!(
        column(&rows, "Customer ID"),
        vec![Value::from("4"), Value::from("4"), Value::from("5, 6")]
    );
}

#[test]
fn sum_and_max_by_customer() {
    init_debug_for_tests();
    let f = fixtures();
    let customer = f.sales.field("customer_id").unwrap();
    let amount = f.sales.field("amount").unwrap();
    let due = f.sales.field("payment_due").unwrap();

    let rows = f
        .sales
        .pivot(
            &[customer],
            &[(amount, AggregationMethod::Sum), (due, AggregationMethod::Max)],
        )
        .unwrap()
        .all(&Params::new())
        .unwrap();

    // one group per distinct customer, the missing customer included
    assert_eq!(
        column(&rows, "Customer ID"),
        vec![Value::Null, Value::Int64(4), Value::Int64(5), Value::Int64(6)]
    );
    assert_eq!(
        column(&rows, "Amount"),
        [300, 400, 200, 300]
            .into_iter()
            .map(|v| Value::Decimal(Decimal::new(v, 0)))
            .collect::<Vec<_>>()
    );
    // a NULL due date aggregates as the earliest representable date
    let due = column(&rows, "Payment Due");
    assert!(matches!(due[0], Value::Date(_)));
    assert_eq!(due[1], Value::from(helpers::data::date(2010, 1, 13)));
}

#[test]
fn pivot_counts_distinct_composite_keys() {
    init_debug_for_tests();
    let f = fixtures();
    let id = f.sales.field("id").unwrap();
    let sales_date = f.sales.field("sales_date").unwrap();
    let amount = f.sales.field("amount").unwrap();

    let rows = f
        .sales
        .pivot(&[id, sales_date], &[(amount, AggregationMethod::First)])
        .unwrap()
        .all(&Params::new())
        .unwrap();
    assert_eq!(rows.len(), 4);
}

#[test]
fn unknown_method_is_reported() {
    let err = AggregationMethod::by_name("median").unwrap_err();
    assert!(matches!(err, QueryError::UnknownIdentifier { .. }));
    assert!(err.to_string().contains("median"));
}

#[test]
fn pivot_fields_must_exist() {
    init_debug_for_tests();
    let f = fixtures();
    let foreign = f.customers.field("id").unwrap();
    assert!(f.sales.pivot(&[foreign], &[]).is_err());
}
