//! Declarative macro for UPnP operation definitions
//!
//! Each operation gets a request struct (with `instance_id` always first), a
//! zero-sized operation type and its [`UPnPOperation`](super::UPnPOperation)
//! impl. Arguments go on the wire in the order they are listed, after
//! `InstanceID`.

/// Define a UPnP operation
///
/// # Example
/// ```rust,ignore
/// define_upnp_operation! {
///     operation: Play,
///     action: "Play",
///     service: AVTransport,
///     request: {
///         speed: String => "Speed",
///     },
///     response: (),
///     parse: |_response| Ok(()),
/// }
/// ```
macro_rules! define_upnp_operation {
    (
        operation: $name:ident,
        action: $action:literal,
        service: $service:ident,
        request: {
            $($field:ident: $field_type:ty => $arg:literal),* $(,)?
        },
        response: $response_type:ty,
        parse: |$response:ident| $parse_expr:expr $(,)?
    ) => {
        paste::paste! {
            #[doc = concat!("Request for `", $action, "`")]
            #[derive(serde::Serialize, Clone, Debug, PartialEq)]
            pub struct [<$name Request>] {
                pub instance_id: u32,
                $(pub $field: $field_type,)*
            }

            impl [<$name Request>] {
                /// Request for instance 0, the only instance most renderers have
                #[allow(clippy::new_without_default)]
                pub fn new($($field: $field_type),*) -> Self {
                    Self {
                        instance_id: 0,
                        $($field,)*
                    }
                }
            }

            #[doc = concat!("`", $action, "` action")]
            #[derive(Debug, Clone, Copy)]
            pub struct [<$name Operation>];

            impl $crate::operation::UPnPOperation for [<$name Operation>] {
                type Request = [<$name Request>];
                type Response = $response_type;

                const SERVICE: $crate::ServiceKind = $crate::ServiceKind::$service;
                const ACTION: &'static str = $action;

                fn build_arguments(request: &Self::Request) -> $crate::Result<Vec<(&'static str, String)>> {
                    $crate::operation::Validate::validate(request)?;
                    Ok(vec![
                        ("InstanceID", request.instance_id.to_string()),
                        $(($arg, request.$field.to_string()),)*
                    ])
                }

                fn parse_response($response: &$crate::ActionResponse) -> $crate::Result<Self::Response> {
                    $parse_expr
                }
            }
        }
    };
}

pub(crate) use define_upnp_operation;
