#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use fold_entity::{
    Amount, ChildRecord, ClientConfig, Connection, Entity, EntityBase, IntSet, Mapping,
    MockTransport, Record, SchemaRegistry, SecretString, StringSet, TimeSeriesRecord,
    TypeDefinition, VerifyString,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub city: String,
    pub post_code: String,
    pub country_code: String,
}

impl Record for Address {
    fn describe(m: &mut Mapping<Self>) {
        m.field("City", "", |a| &a.city, |a| &mut a.city)
            .field("PostCode", ",omitempty", |a| &a.post_code, |a| &mut a.post_code)
            .field("CountryCode", "", |a| &a.country_code, |a| &mut a.country_code);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Audit {
    pub created_by: String,
}

impl Record for Audit {
    fn describe(m: &mut Mapping<Self>) {
        m.field("CreatedBy", "", |a| &a.created_by, |a| &mut a.created_by);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub quantity: i64,
}

impl ChildRecord for LineItem {
    fn child_id(&self) -> String {
        self.id.clone()
    }

    fn set_child_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

impl LineItem {
    pub fn new(name: &str, quantity: i64) -> Self {
        Self {
            id: String::new(),
            name: name.to_string(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Customer {
    pub base: EntityBase,
    pub entity_id: String,
    pub name: String,
    pub email: String,
    pub nickname: String,
    pub reference: String,
    pub secret: SecretString,
    pub address: Address,
    pub billing: Option<Address>,
    pub balance: Amount,
    pub age: i64,
    pub vip: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub scratch: String,
    pub audit: Audit,
    pub tags: Vec<String>,
    pub line_items: Vec<LineItem>,
}

impl Record for Customer {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("customer")
            .with_singular("Customer")
            .with_plural("Customers")
    }

    fn describe(m: &mut Mapping<Self>) {
        m.field("EntityID", "_entity_id", |c| &c.entity_id, |c| &mut c.entity_id)
            .field("Name", "", |c| &c.name, |c| &mut c.name)
            .field("EmailAddress", "email,unique,pii", |c| &c.email, |c| &mut c.email)
            .field("Nickname", ",omitempty", |c| &c.nickname, |c| &mut c.nickname)
            .field("Reference", ",omitempty,required", |c| &c.reference, |c| &mut c.reference)
            .field("Secret", "", |c| &c.secret, |c| &mut c.secret)
            .nested("Address", "", |c| &c.address, |c| &mut c.address)
            .nested_optional("Billing", "", |c| &c.billing, |c| &mut c.billing)
            .field("Balance", "", |c| &c.balance, |c| &mut c.balance)
            .field("Age", "", |c| &c.age, |c| &mut c.age)
            .field("VIP", "", |c| &c.vip, |c| &mut c.vip)
            .field("LastSeen", ",omitempty", |c| &c.last_seen, |c| &mut c.last_seen)
            .field("Scratch", "-", |c| &c.scratch, |c| &mut c.scratch)
            .embed(|c| &c.audit, |c| &mut c.audit)
            .field("Tags", ",omitempty", |c| &c.tags, |c| &mut c.tags)
            .children("LineItems", "", |c| &c.line_items, |c| &mut c.line_items);
    }
}

impl Entity for Customer {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}

/// A customer populated the way most tests need it
pub fn sample_customer() -> Customer {
    Customer {
        name: "John Doe".to_string(),
        email: "john@example.com".to_string(),
        secret: SecretString::masked_from("John Doe"),
        address: Address {
            city: "Portsmouth".to_string(),
            post_code: String::new(),
            country_code: "GB".to_string(),
        },
        balance: Amount::new("GBP", 1250),
        age: 42,
        vip: true,
        audit: Audit {
            created_by: "tester".to_string(),
        },
        line_items: vec![LineItem::new("widget", 2), LineItem::new("gadget", 5)],
        ..Customer::default()
    }
}

/// A child type relying on the default child id handling
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
}

impl ChildRecord for Note {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Journal {
    pub base: EntityBase,
    pub name: String,
    pub notes: Vec<Note>,
}

impl Record for Journal {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("journal")
    }

    fn describe(m: &mut Mapping<Self>) {
        m.field("Name", "", |j| &j.name, |j| &mut j.name)
            .children("Notes", "", |j| &j.notes, |j| &mut j.notes);
    }
}

impl Entity for Journal {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    pub base: EntityBase,
    pub device: String,
    pub temperature: f64,
    pub taken_at: Option<DateTime<Utc>>,
}

impl Record for Reading {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("reading")
    }

    fn describe(m: &mut Mapping<Self>) {
        m.field("Device", "", |r| &r.device, |r| &mut r.device)
            .field("Temperature", "", |r| &r.temperature, |r| &mut r.temperature);
    }
}

impl Entity for Reading {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}

impl TimeSeriesRecord for Reading {
    fn time_series_input_time(&self) -> DateTime<Utc> {
        self.taken_at.unwrap_or_else(Utc::now)
    }
}

/// One field of every supported value kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    pub title: String,
    pub count: i64,
    pub small: i32,
    pub unsigned: u32,
    pub tiny: i16,
    pub tiny_unsigned: u16,
    pub active: bool,
    pub ratio: f64,
    pub weight: f32,
    pub stocked_at: DateTime<Utc>,
    pub audited_at: Option<DateTime<Utc>>,
    pub secret: SecretString,
    pub pin: VerifyString,
    pub price: Amount,
    pub attributes: HashMap<String, String>,
    pub ordered_attributes: BTreeMap<String, String>,
    pub blobs: BTreeMap<String, Vec<u8>>,
    pub aliases: Vec<String>,
    pub tags: StringSet,
    pub codes: Vec<i64>,
    pub bins: IntSet,
    pub thumbnail: Vec<u8>,
}

impl Record for Inventory {
    fn definition() -> TypeDefinition {
        TypeDefinition::new("inventory")
    }

    fn describe(m: &mut Mapping<Self>) {
        m.field("Title", "", |i| &i.title, |i| &mut i.title)
            .field("Count", "", |i| &i.count, |i| &mut i.count)
            .field("Small", "", |i| &i.small, |i| &mut i.small)
            .field("Unsigned", "", |i| &i.unsigned, |i| &mut i.unsigned)
            .field("Tiny", "", |i| &i.tiny, |i| &mut i.tiny)
            .field("TinyUnsigned", "", |i| &i.tiny_unsigned, |i| &mut i.tiny_unsigned)
            .field("Active", "", |i| &i.active, |i| &mut i.active)
            .field("Ratio", "", |i| &i.ratio, |i| &mut i.ratio)
            .field("Weight", "", |i| &i.weight, |i| &mut i.weight)
            .field("StockedAt", "", |i| &i.stocked_at, |i| &mut i.stocked_at)
            .field("AuditedAt", "", |i| &i.audited_at, |i| &mut i.audited_at)
            .field("Secret", "", |i| &i.secret, |i| &mut i.secret)
            .field("Pin", "", |i| &i.pin, |i| &mut i.pin)
            .field("Price", "", |i| &i.price, |i| &mut i.price)
            .field("Attributes", "", |i| &i.attributes, |i| &mut i.attributes)
            .field(
                "OrderedAttributes",
                "",
                |i| &i.ordered_attributes,
                |i| &mut i.ordered_attributes,
            )
            .field("Blobs", "", |i| &i.blobs, |i| &mut i.blobs)
            .field("Aliases", "", |i| &i.aliases, |i| &mut i.aliases)
            .field("Tags", "", |i| &i.tags, |i| &mut i.tags)
            .field("Codes", "", |i| &i.codes, |i| &mut i.codes)
            .field("Bins", "", |i| &i.bins, |i| &mut i.bins)
            .field("Thumbnail", "", |i| &i.thumbnail, |i| &mut i.thumbnail);
    }
}

pub fn sample_inventory() -> Inventory {
    Inventory {
        title: "Bolts".to_string(),
        count: 1200,
        small: -42,
        unsigned: 4_000_000,
        tiny: -7,
        tiny_unsigned: 65_000,
        active: true,
        ratio: 0.375,
        weight: 2.5,
        stocked_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        audited_at: Some(Utc.with_ymd_and_hms(2024, 6, 15, 17, 0, 0).unwrap()),
        secret: SecretString::masked_from("Bolt Supplier"),
        pin: VerifyString::new("4321"),
        price: Amount::new("EUR", 1999),
        attributes: HashMap::from([("finish".to_string(), "zinc".to_string())]),
        ordered_attributes: BTreeMap::from([
            ("head".to_string(), "hex".to_string()),
            ("thread".to_string(), "M8".to_string()),
        ]),
        blobs: BTreeMap::from([("spec".to_string(), vec![0, 159, 255])]),
        aliases: vec!["bolt".to_string(), "fastener".to_string()],
        tags: StringSet::new(["hardware", "metal"]),
        codes: vec![3, 1, 2],
        bins: IntSet::new([10, 20]),
        thumbnail: vec![137, 80, 78, 71],
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig::new("vendor", "app", "token")
}

/// A connection with its own registry over a fresh mock store
pub fn mock_connection() -> (Arc<MockTransport>, Connection) {
    mock_connection_with(MockTransport::new())
}

pub fn mock_connection_with(transport: MockTransport) -> (Arc<MockTransport>, Connection) {
    let transport = Arc::new(transport);
    let connection = Connection::with_registry(
        transport.clone(),
        test_config(),
        Arc::new(SchemaRegistry::new()),
    );
    (transport, connection)
}
