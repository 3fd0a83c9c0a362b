use chrono::{NaiveDate, NaiveDateTime};
use tabula::exec::scan::{Params, SourceRow, SourceRows};
use tabula::{Catalog, FieldDef, MemorySource, Table, Value};

#[allow(dead_code)]
pub struct Fixtures {
    pub catalog: Catalog,
    pub sales: Table,
    pub customers: Table,
    pub inventory: Table,
}

#[allow(dead_code)]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(0, 0, 0).unwrap()
}

fn int(v: Option<i64>) -> Value {
    v.map(Value::Int64).unwrap_or(Value::Null)
}

#[allow(dead_code)]
pub fn fixtures() -> Fixtures {
    let catalog = Catalog::new();
    Fixtures {
        sales: sales(&catalog),
        customers: customers(&catalog),
        inventory: inventory(&catalog),
        catalog,
    }
}

fn sales(catalog: &Catalog) -> Table {
    let rows = [
        (1, Some(4), Some(1), 1, 100, Some(11)),
        (2, Some(5), Some(2), 2, 200, Some(12)),
        (3, Some(4), None, 3, 300, Some(13)),
        (4, Some(6), Some(2), 3, 300, None),
        (4, None, Some(1), 3, 300, None),
    ]
    .into_iter()
    .map(|(id, customer, item, day, amount, due)| {
        vec![
            Value::Int64(id),
            int(customer),
            int(item),
            Value::from(midnight(2010, 1, day)),
            Value::Int64(amount),
            due.map(|d| Value::from(date(2010, 1, d))).unwrap_or(Value::Null),
        ]
    })
    .collect::<Vec<_>>();

    catalog
        .table("Sales")
        .field("id", FieldDef::int("ID"))
        .field("customer_id", FieldDef::int("Customer ID"))
        .field("item_id", FieldDef::int("Item ID"))
        .field("sales_date", FieldDef::date("Sales Date", false))
        .field("amount", FieldDef::currency("Amount"))
        .field("payment_due", FieldDef::date("Payment Due", false))
        .source(MemorySource::new(rows))
        .build()
        .unwrap()
}

/// Honours an `id` parameter by yielding only that customer.
fn customers(catalog: &Catalog) -> Table {
    let source = |params: &Params| -> anyhow::Result<SourceRows> {
        let rows = vec![
            (4, "Mark", Some("Stefanovic")),
            (6, "Mike", Some("Smith")),
            (7, "Sally", Some("Jones")),
            (8, "Mr. X", None),
        ];
        let wanted = params.get("id").cloned();
        Ok(Box::new(
            rows.into_iter()
                .filter(move |(id, _, _)| match &wanted {
                    Some(w) => *w == Value::Int64(*id),
                    None => true,
                })
                .map(|(id, first, last)| {
                    anyhow::Ok(SourceRow::from(vec![
                        Value::Int64(id),
                        Value::from(first),
                        last.map(Value::from).unwrap_or(Value::Null),
                    ]))
                }),
        ))
    };

    catalog
        .table("Customer")
        .field("id", FieldDef::int("id"))
        .field("first_name", FieldDef::string("First Name"))
        .field("last_name", FieldDef::string("Last Name"))
        .source(source)
        .build()
        .unwrap()
}

fn inventory(catalog: &Catalog) -> Table {
    catalog
        .table("Inventory")
        .field("id", FieldDef::int("id"))
        .field("name", FieldDef::string("Item Name"))
        .field("cost", FieldDef::currency("Cost"))
        .source(MemorySource::new(vec![
            vec![Value::Int64(1), Value::from("Cup"), Value::Float64(4.72)],
            vec![Value::Int64(2), Value::from("Shovel"), Value::Float64(12.92)],
            vec![Value::Int64(3), Value::from("Cupcake"), Value::Float64(0.99)],
        ]))
        .build()
        .unwrap()
}
