//! Native boundary
//!
//! `greeting` backs `stringFromJNI`. With the `jni` feature enabled, the
//! `android` module exports the JNI entry points that the Java activity
//! calls and implements the runtime, callback target and status sink on
//! top of a `JavaVM`.

#[cfg(feature = "jni")]
pub mod android;
pub mod methods;
#[cfg(feature = "jni")]
mod probes;

/// Android ABI name of the compile target.
pub const fn abi_name() -> &'static str {
    if cfg!(all(target_arch = "arm", target_feature = "v7")) {
        "armeabi-v7a"
    } else if cfg!(target_arch = "arm") {
        "armeabi"
    } else if cfg!(target_arch = "aarch64") {
        "arm64-v8a"
    } else if cfg!(target_arch = "x86") {
        "x86"
    } else if cfg!(target_arch = "x86_64") {
        "x86_64"
    } else if cfg!(target_arch = "mips64") {
        "mips64"
    } else if cfg!(target_arch = "mips") {
        "mips"
    } else {
        "unknown"
    }
}

/// Fixed greeting returned across the boundary
pub fn greeting() -> String {
    format!("Hello from JNI !  Compiled with ABI {}.", abi_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_names_abi() {
        let text = greeting();
        assert!(text.starts_with("Hello from JNI !  Compiled with ABI "));
        assert!(text.ends_with(&format!("{}.", abi_name())));
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_x86_64_abi() {
        assert_eq!(abi_name(), "x86_64");
    }
}
