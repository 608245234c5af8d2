//! Marshalling probes: round-trip a few value kinds through the activity's
//! `method_para_*` methods. Results are only logged.

use jni::errors::Result;
use jni::objects::{JObject, JString, JValue};
use jni::JNIEnv;

use super::methods::{
    INT_RETURN_INT, LONG_RETURN_LONG, LONG_RETURN_OBJ, LONG_RETURN_VOID, STRING_RETURN_STRING,
    VOID_RETURN_STRING, VOID_RETURN_VOID,
};

const PROBE_LONG: i64 = 1 << 40;
const PROBE_INT: i32 = 7;
const PROBE_STRING: &str = "111";
const LOCAL_FRAME_CAPACITY: i32 = 16;

/// Run every probe inside its own local frame so nothing leaks on a
/// thread that never returns to Java.
pub(super) fn run_marshalling_probes(env: &mut JNIEnv, activity: &JObject) {
    let result: Result<()> = env.with_local_frame(LOCAL_FRAME_CAPACITY, |env| probe_all(env, activity));

    if let Err(e) = result {
        if env.exception_check().unwrap_or(false) {
            let _ = env.exception_clear();
        }
        tracing::warn!(target: "ffi", error = %e, "marshalling probe failed");
    }
}

fn probe_all(env: &mut JNIEnv, activity: &JObject) -> Result<()> {
    env.call_method(activity, VOID_RETURN_VOID.name, VOID_RETURN_VOID.signature, &[])?;

    let boxed = env.new_object("java/lang/Long", "(J)V", &[JValue::Long(PROBE_LONG)])?;
    let returned = env
        .call_method(
            activity,
            LONG_RETURN_LONG.name,
            LONG_RETURN_LONG.signature,
            &[JValue::Object(&boxed)],
        )?
        .l()?;
    let long_value = if returned.is_null() {
        None
    } else {
        Some(env.call_method(&returned, "longValue", "()J", &[])?.j()?)
    };

    env.call_method(
        activity,
        LONG_RETURN_VOID.name,
        LONG_RETURN_VOID.signature,
        &[JValue::Long(PROBE_LONG)],
    )?;

    let int_value = env
        .call_method(activity, INT_RETURN_INT.name, INT_RETURN_INT.signature, &[JValue::Int(PROBE_INT)])?
        .i()?;

    let argument = env.new_string(PROBE_STRING)?;
    let echoed = env
        .call_method(
            activity,
            STRING_RETURN_STRING.name,
            STRING_RETURN_STRING.signature,
            &[JValue::Object(&argument)],
        )?
        .l()?;
    let string_value: Option<String> = if echoed.is_null() {
        None
    } else {
        let echoed = JString::from(echoed);
        let value = env.get_string(&echoed)?.into();
        Some(value)
    };

    let produced = env
        .call_method(activity, VOID_RETURN_STRING.name, VOID_RETURN_STRING.signature, &[])?
        .l()?;
    let produced_value: Option<String> = if produced.is_null() {
        None
    } else {
        let produced = JString::from(produced);
        let value = env.get_string(&produced)?.into();
        Some(value)
    };

    let object = env
        .call_method(
            activity,
            LONG_RETURN_OBJ.name,
            LONG_RETURN_OBJ.signature,
            &[JValue::Object(&boxed)],
        )?
        .l()?;

    tracing::trace!(
        target: "ffi",
        long_in = PROBE_LONG,
        long_out = ?long_value,
        int_in = PROBE_INT,
        int_out = int_value,
        string_out = ?string_value,
        string_produced = ?produced_value,
        object_is_null = object.is_null(),
        "marshalling probes complete"
    );
    Ok(())
}
