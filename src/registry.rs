//! Sub-API registration
//!
//! A sub-API groups the remote methods of one resource (customers, orders,
//! products, ...). Every built-in sub-API is listed once in
//! [`crate::resources::registrations`]; the table is built on first use and
//! never changes afterwards. The root [`Api`] itself is not a sub-API and is
//! never registered.

use crate::api::Api;
use crate::utils::{camel_to_snake, short_type_name};
use std::any::{Any, TypeId};
use std::sync::{Arc, LazyLock};

/// Type-erased sub-API instance as stored in the per-session cache
pub type AnyInstance = Arc<dyn Any + Send + Sync>;

/// A capability type wrapping its own logged-in [`Api`]
pub trait SubApi: Any + Send + Sync + Sized {
    /// Wrap an already logged-in session
    fn from_api(api: Api) -> Self;

    /// The session this sub-API calls through
    fn api(&self) -> &Api;

    /// Canonical snake_case name derived from the type name
    fn canonical_name() -> String {
        camel_to_snake(short_type_name(std::any::type_name::<Self>()))
    }
}

/// One row of the registration table
pub struct Registration {
    pub name: String,
    pub type_name: &'static str,
    pub(crate) type_id: TypeId,
    pub(crate) build: fn(Api) -> AnyInstance,
}

impl Registration {
    pub fn of<T: SubApi>() -> Self {
        Self {
            name: T::canonical_name(),
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            build: build_instance::<T>,
        }
    }
}

pub(crate) fn build_instance<T: SubApi>(api: Api) -> AnyInstance {
    Arc::new(T::from_api(api))
}

static REGISTRY: LazyLock<Vec<Registration>> = LazyLock::new(crate::resources::registrations);

/// All registered sub-APIs
pub fn registrations() -> &'static [Registration] {
    &REGISTRY
}

/// Find a registered sub-API by canonical name
pub fn lookup(name: &str) -> Option<&'static Registration> {
    REGISTRY.iter().find(|r| r.name == name)
}

/// Define a sub-API type: the struct, its [`SubApi`] impl, `Deref` to the
/// wrapped [`Api`] and a typed accessor on [`Api`].
macro_rules! sub_api {
    ($(#[$meta:meta])* $name:ident => $accessor:ident) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name {
            api: $crate::api::Api,
        }

        impl $crate::registry::SubApi for $name {
            fn from_api(api: $crate::api::Api) -> Self {
                Self { api }
            }

            fn api(&self) -> &$crate::api::Api {
                &self.api
            }
        }

        impl std::ops::Deref for $name {
            type Target = $crate::api::Api;

            fn deref(&self) -> &Self::Target {
                &self.api
            }
        }

        impl $crate::api::Api {
            #[doc = concat!("Cached, logged-in [`", stringify!($name), "`] sub-API")]
            pub async fn $accessor(&self) -> $crate::error::Result<std::sync::Arc<$name>> {
                self.get_instance_of::<$name>().await
            }
        }
    };
}

pub(crate) use sub_api;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique_snake_case() {
        let mut seen = HashSet::new();
        for registration in registrations() {
            assert_eq!(registration.name, camel_to_snake(short_type_name(registration.type_name)));
            assert!(!registration.name.chars().any(|c| c.is_ascii_uppercase()));
            assert!(seen.insert(registration.name.clone()), "duplicate {}", registration.name);
        }
    }

    #[test]
    fn generated_sub_apis_are_debug() {
        use crate::config::SessionConfig;
        use crate::resources::Customer;

        let api = Api::new(SessionConfig::new("https://shop.example.com", "u", "k")).unwrap();
        let customer = Customer::from_api(api);
        let printed = format!("{:?}", customer);
        assert!(printed.starts_with("Customer"));
        assert!(printed.contains("index.php/api/xmlrpc"));
    }

    #[test]
    fn lookup_by_canonical_name() {
        let customer = lookup("customer").expect("customer is registered");
        assert!(customer.type_name.ends_with("::Customer"));
        assert!(lookup("sales_order").is_some());
        assert!(lookup("api").is_none());
        assert!(lookup("Customer").is_none());
    }
}
