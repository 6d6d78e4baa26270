mod appearance;
mod auth;
mod http;
mod kv;
mod object_store;
mod records;

pub use self::appearance::{Appearance, AppearanceOperation, ColorScheme, ColorSchemeChange};
pub use self::auth::{
    Auth, AuthError, AuthOperation, AuthOutput, AuthResult, AuthStateChange, Credentials,
    Password, Session, User,
};
pub use self::http::{take_json, RecipeApiError, ValidatedUrl};
pub use self::kv::{check_value_size, KvError, KvKey};
pub use self::object_store::{
    ObjectStore, ObjectStoreError, ObjectStoreOperation, ObjectStoreOutput, ObjectStoreResult,
};
pub use self::records::{RecordError, RecordOperation, RecordOutput, RecordResult, Records};

pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::KeyValue;

// Needed in scope by the `Effect` derive.
#[allow(unused_imports)]
use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub auth: Auth<Event>,
    pub records: Records<Event>,
    pub object_store: ObjectStore<Event>,
    pub appearance: Appearance<Event>,
    pub http: Http<Event>,
    pub kv: KeyValue<Event>,
    pub render: Render<Event>,
}
