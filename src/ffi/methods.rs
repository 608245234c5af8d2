//! Java methods the native side calls on `MainActivity`, by name and JNI
//! signature.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JavaMethod {
    pub name: &'static str,
    pub signature: &'static str,
}

impl JavaMethod {
    const fn new(name: &'static str, signature: &'static str) -> Self {
        Self { name, signature }
    }

    /// JNI return descriptor, e.g. `V` or `Ljava/lang/String;`
    pub fn return_type(&self) -> &'static str {
        match self.signature.rfind(')') {
            Some(close) => &self.signature[close + 1..],
            None => "",
        }
    }
}

pub const UPDATE_TIMER: JavaMethod = JavaMethod::new("updateTimer", "()V");

pub const VOID_RETURN_VOID: JavaMethod = JavaMethod::new("method_para_void_return_void", "()V");
pub const LONG_RETURN_LONG: JavaMethod =
    JavaMethod::new("method_para_long_return_long", "(Ljava/lang/Long;)Ljava/lang/Long;");
pub const LONG_RETURN_VOID: JavaMethod = JavaMethod::new("method_para_long_return_void", "(J)V");
pub const INT_RETURN_INT: JavaMethod = JavaMethod::new("method_para_int_return_int", "(I)I");
pub const STRING_RETURN_STRING: JavaMethod = JavaMethod::new(
    "method_para_string_return_string",
    "(Ljava/lang/String;)Ljava/lang/String;",
);
pub const VOID_RETURN_STRING: JavaMethod =
    JavaMethod::new("method_para_void_return_String", "()Ljava/lang/String;");
pub const LONG_RETURN_OBJ: JavaMethod =
    JavaMethod::new("method_para_long_return_obj", "(Ljava/lang/Long;)Ljava/lang/Object;");

/// Every marshalling probe, in call order
pub const MARSHALLING_PROBES: [JavaMethod; 7] = [
    VOID_RETURN_VOID,
    LONG_RETURN_LONG,
    LONG_RETURN_VOID,
    INT_RETURN_INT,
    STRING_RETURN_STRING,
    VOID_RETURN_STRING,
    LONG_RETURN_OBJ,
];

/// Result of reading a Java string argument; failures fall back to empty.
pub fn param_or_empty<E: fmt::Display>(read: Result<String, E>) -> String {
    match read {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(target: "ffi", error = %e, "could not read param string, using empty");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_set_covers_boundary() {
        let names: Vec<_> = MARSHALLING_PROBES.iter().map(|m| m.name).collect();
        assert!(names.contains(&"method_para_long_return_void"));
        assert!(names.contains(&"method_para_void_return_String"));
        assert_eq!(names.len(), 7);

        let mut unique = names.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_signatures_well_formed() {
        for method in MARSHALLING_PROBES.iter().chain([&UPDATE_TIMER]) {
            assert!(method.signature.starts_with('('), "{}", method.name);
            assert!(!method.return_type().is_empty(), "{}", method.name);
        }
        assert_eq!(LONG_RETURN_VOID.return_type(), "V");
        assert_eq!(VOID_RETURN_STRING.return_type(), "Ljava/lang/String;");
        assert_eq!(INT_RETURN_INT.return_type(), "I");
    }

    #[test]
    fn test_param_read_failure_falls_back() {
        assert_eq!(param_or_empty::<String>(Ok("11211".to_string())), "11211");
        assert_eq!(param_or_empty(Err("invalid modified utf-8")), "");
    }
}
