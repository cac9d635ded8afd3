// @generated by modelq (modelq-cli)
// Table: public.value

pub static VALUE: ::modelq::TableModel = ::modelq::TableModel::new("public", "value")
    .with_alias("Value")
    .with_columns(&["id", "label", "type", "created"])
    .with_primary_key("id");

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Value {
    pub id: i64,
    /// shown in lists
    pub label: String,
    pub r#type: String,
    pub created: chrono::NaiveDateTime,
}

impl ::modelq::Model for Value {
    const TABLE: &'static ::modelq::TableModel = &VALUE;
    const INSERTABLE: &'static [&'static str] = &["label", "type"];
    const UPDATABLE: &'static [&'static str] = &["label", "type", "created"];

    fn set_column(&mut self, column: &str, cell: &[u8]) {
        match column {
            "id" => self.id = ::modelq::row::FromCell::from_cell(cell),
            "label" => self.label = ::modelq::row::FromCell::from_cell(cell),
            "type" => self.r#type = ::modelq::row::FromCell::from_cell(cell),
            "created" => self.created = ::modelq::row::FromCell::from_cell(cell),
            _ => {}
        }
    }

    fn column_value(&self, column: &str) -> Option<::modelq::Value> {
        match column {
            "id" => Some(self.id.into()),
            "label" => Some(self.label.clone().into()),
            "type" => Some(self.r#type.clone().into()),
            "created" => Some(self.created.into()),
            _ => None,
        }
    }

    fn set_insert_id(&mut self, id: i64) {
        self.id = id;
    }
}

impl Value {
    pub fn select(columns: &[&str]) -> ::modelq::ModelQuery<Self> {
        ::modelq::ModelQuery::select(columns)
    }

    pub fn insert_query(&self) -> ::modelq::ModelQuery<Self> {
        ::modelq::ModelQuery::insert(self)
    }

    pub fn update_query(&self, columns: &[&str]) -> ::modelq::ModelQuery<Self> {
        ::modelq::ModelQuery::update(self, columns)
    }

    pub fn delete_query() -> ::modelq::ModelQuery<Self> {
        ::modelq::ModelQuery::delete()
    }

    pub fn filter_id<V: Into<::modelq::Value>>(op: &str, first: V, rest: impl IntoIterator<Item = V>) -> ::modelq::Filter {
        ::modelq::Filter::from_op("id", op, first, rest)
    }

    pub fn filter_label<V: Into<::modelq::Value>>(op: &str, first: V, rest: impl IntoIterator<Item = V>) -> ::modelq::Filter {
        ::modelq::Filter::from_op("label", op, first, rest)
    }

    pub fn filter_type<V: Into<::modelq::Value>>(op: &str, first: V, rest: impl IntoIterator<Item = V>) -> ::modelq::Filter {
        ::modelq::Filter::from_op("type", op, first, rest)
    }

    pub fn filter_created<V: Into<::modelq::Value>>(op: &str, first: V, rest: impl IntoIterator<Item = V>) -> ::modelq::Filter {
        ::modelq::Filter::from_op("created", op, first, rest)
    }
}
