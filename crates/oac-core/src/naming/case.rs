//! Casing helpers shared by naming, flags, and ids.

use heck::{ToKebabCase, ToLowerCamelCase};

/// Kebab-case an arbitrary identifier, path segment, or title.
pub fn kebab(input: &str) -> String {
    input.to_kebab_case()
}

/// camelCase key for a long flag name, matching the argv-parser convention
/// of rewriting `--x-request-id` to `xRequestId` for lookups.
pub fn camel(input: &str) -> String {
    input.to_lower_camel_case()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kebab_handles_camel_and_pascal() {
        assert_eq!(kebab("listContacts"), "list-contacts");
        assert_eq!(kebab("CreatePod"), "create-pod");
        assert_eq!(kebab("getHTTPStatus"), "get-http-status");
    }

    #[test]
    fn kebab_handles_separators() {
        assert_eq!(kebab("user_roles"), "user-roles");
        assert_eq!(kebab("My Cool API"), "my-cool-api");
        assert_eq!(kebab("users.list"), "users-list");
    }

    #[test]
    fn camel_inverts_flag_names() {
        assert_eq!(camel("x-request-id"), "xRequestId");
        assert_eq!(camel("limit"), "limit");
        assert_eq!(camel("server-var"), "serverVar");
    }
}
