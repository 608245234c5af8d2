//! JNI entry points for `com.example.hellojnicallback.MainActivity`
//!
//! `JNI_OnLoad` caches the `JavaVM`, creates the `JniHandler` helper used
//! for status lines and builds the process-wide controller. `startTicks`
//! binds the calling activity as a weakly referenced callback target;
//! `StopTicks` returns only after the ticker thread has detached and exited.
//!
//! No panic unwinds into the JVM: every export runs under `ffi_guard`.

use super::greeting;
use super::methods::{param_or_empty, UPDATE_TIMER};
use super::probes::run_marshalling_probes;
use crate::bridge::{Attachment, CallbackTarget, ManagedRuntime, StatusSink};
use crate::errors::{AttachError, CallbackError};
use crate::frontend::Config;
use crate::infrastructure::logging::init_logging;
use crate::lifecycle::LifecycleController;
use jni::objects::{GlobalRef, JClass, JMethodID, JObject, JString, JValue, WeakRef};
use jni::signature::{Primitive, ReturnType};
use jni::sys::{jint, jstring, JNI_ERR, JNI_VERSION_1_6};
use jni::{JNIEnv, JavaVM};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::{Arc, Weak};
use tracing_appender::non_blocking::WorkerGuard;

const HELPER_CLASS: &str = "com/example/hellojnicallback/JniHandler";

static CONTEXT: OnceCell<JniContext> = OnceCell::new();
static LOG_GUARD: Mutex<Option<WorkerGuard>> = parking_lot::const_mutex(None);

/// The JVM as a `ManagedRuntime`
pub struct JvmRuntime {
    vm: JavaVM,
}

impl JvmRuntime {
    pub fn new(vm: JavaVM) -> Self {
        Self { vm }
    }

    pub fn vm(&self) -> &JavaVM {
        &self.vm
    }
}

impl ManagedRuntime for JvmRuntime {
    fn name(&self) -> &str {
        "jvm"
    }

    fn attach_current_thread(&self) -> Result<Attachment, AttachError> {
        if self.vm.get_env().is_ok() {
            return Ok(Attachment::Existing);
        }

        self.vm
            .attach_current_thread_permanently()
            .map(|_| Attachment::New)
            .map_err(|e| AttachError::Refused(e.to_string()))
    }

    fn detach_current_thread(&self) {
        // SAFETY: only reached from `AttachGuard::drop` on the thread that
        // attached, after every local reference made through it is gone.
        unsafe { self.vm.detach_current_thread() };
    }
}

/// The Java activity, held weakly, with `updateTimer()` resolved once.
struct JavaActivity {
    runtime: Arc<JvmRuntime>,
    activity: WeakRef,
    update_timer: JMethodID,
    probe_marshalling: bool,
}

impl JavaActivity {
    fn resolve(
        env: &mut JNIEnv,
        instance: &JObject,
        runtime: Arc<JvmRuntime>,
        probe_marshalling: bool,
    ) -> jni::errors::Result<Self> {
        let class = env.get_object_class(instance)?;
        let update_timer = env.get_method_id(&class, UPDATE_TIMER.name, UPDATE_TIMER.signature)?;
        env.delete_local_ref(class)?;

        let activity = env
            .new_weak_ref(instance)?
            .ok_or(jni::errors::Error::NullPtr("activity instance"))?;

        Ok(Self {
            runtime,
            activity,
            update_timer,
            probe_marshalling,
        })
    }
}

impl CallbackTarget for JavaActivity {
    fn update_timer(&self) -> Result<(), CallbackError> {
        let mut env = self
            .runtime
            .vm()
            .get_env()
            .map_err(|e| CallbackError::CallFailed(e.to_string()))?;

        let activity = self
            .activity
            .upgrade_local(&env)
            .map_err(|e| CallbackError::CallFailed(e.to_string()))?
            .ok_or(CallbackError::TargetGone)?;

        // SAFETY: the method id was resolved from this object's class with
        // signature "()V" and takes no arguments.
        let result = unsafe {
            env.call_method_unchecked(
                &activity,
                self.update_timer,
                ReturnType::Primitive(Primitive::Void),
                &[],
            )
        };
        let result = match result {
            Ok(_) => Ok(()),
            Err(e) => Err(call_failed(&mut env, e)),
        };

        if result.is_ok() && self.probe_marshalling {
            run_marshalling_probes(&mut env, &activity);
        }

        let _ = env.delete_local_ref(activity);
        result
    }
}

fn call_failed(env: &mut JNIEnv, error: jni::errors::Error) -> CallbackError {
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_describe();
        let _ = env.exception_clear();
    }
    CallbackError::CallFailed(error.to_string())
}

/// Forwards status lines to `JniHandler.updateStatus(String)`
struct JniStatus {
    runtime: Arc<JvmRuntime>,
    helper: GlobalRef,
    update_status: JMethodID,
}

impl StatusSink for JniStatus {
    fn update_status(&self, message: &str) {
        tracing::info!(target: "ticker", status = message, "ticker status");

        let Ok(mut env) = self.runtime.vm().get_env() else {
            return;
        };

        let text = match env.new_string(message) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(target: "ffi", error = %e, "could not create status string");
                return;
            }
        };

        // SAFETY: method id resolved from JniHandler with signature
        // "(Ljava/lang/String;)V"; the single argument is a String.
        let result = unsafe {
            env.call_method_unchecked(
                &self.helper,
                self.update_status,
                ReturnType::Primitive(Primitive::Void),
                &[JValue::Object(&text).as_jni()],
            )
        };
        if let Err(e) = result {
            let error = call_failed(&mut env, e);
            tracing::warn!(target: "ffi", error = %error, "updateStatus failed");
        }
        let _ = env.delete_local_ref(text);
    }
}

struct JniContext {
    runtime: Arc<JvmRuntime>,
    _helper_class: GlobalRef,
    controller: LifecycleController,
    active: Mutex<Option<Arc<JavaActivity>>>,
    probe_marshalling: bool,
}

impl JniContext {
    fn load(vm: JavaVM) -> jni::errors::Result<Self> {
        let config = Config::discover();
        if let Some(guard) = init_logging(config.logging.to_log_config()) {
            *LOG_GUARD.lock() = Some(guard);
        }

        let runtime = Arc::new(JvmRuntime::new(vm));
        let (helper_class, helper, update_status) = {
            let mut env = runtime.vm().get_env()?;
            let class = env.find_class(HELPER_CLASS)?;
            let helper_class = env.new_global_ref(&class)?;
            let handler = env.new_object(&class, "()V", &[])?;
            let helper = env.new_global_ref(&handler)?;
            let update_status = env.get_method_id(&class, "updateStatus", "(Ljava/lang/String;)V")?;

            if let Err(e) = query_runtime_info(&mut env, &class, &handler) {
                let error = call_failed(&mut env, e);
                tracing::warn!(target: "ffi", error = %error, "runtime info query failed");
            }
            (helper_class, helper, update_status)
        };

        let status = Arc::new(JniStatus {
            runtime: Arc::clone(&runtime),
            helper,
            update_status,
        });
        let controller = LifecycleController::new(runtime.clone(), status, config.ticker.clone());

        Ok(Self {
            runtime,
            _helper_class: helper_class,
            controller,
            active: Mutex::new(None),
            probe_marshalling: config.bridge.probe_marshalling,
        })
    }

    fn start_ticks(&self, env: &mut JNIEnv, instance: &JObject, param: &str) -> Result<(), String> {
        let mut active = self.active.lock();
        if self.controller.is_running() {
            tracing::debug!(target: "ffi", "startTicks while ticking, ignored");
            return Ok(());
        }

        let activity = JavaActivity::resolve(env, instance, Arc::clone(&self.runtime), self.probe_marshalling)
            .map_err(|e| e.to_string())?;
        let activity = Arc::new(activity);
        let target: Weak<dyn CallbackTarget> = Arc::downgrade(&activity) as Weak<dyn CallbackTarget>;

        self.controller.start(target, param).map_err(|e| e.to_string())?;
        *active = Some(activity);
        Ok(())
    }

    fn stop_ticks(&self) {
        let mut active = self.active.lock();
        self.controller.stop();
        // Released only after the worker is joined
        active.take();
    }
}

/// Log the Android version (static `getBuildVersion()`) and the runtime's
/// free memory (instance `getRuntimeMemorySize()`).
fn query_runtime_info(env: &mut JNIEnv, class: &JClass, handler: &JObject) -> jni::errors::Result<()> {
    let version = env
        .call_static_method(class, "getBuildVersion", "()Ljava/lang/String;", &[])?
        .l()?;
    let version = JString::from(version);
    let text: String = env.get_string(&version)?.into();
    env.delete_local_ref(version)?;

    let free_memory = env.call_method(handler, "getRuntimeMemorySize", "()J", &[])?.j()?;

    tracing::info!(target: "ffi", android_version = %text, free_memory, "runtime info");
    Ok(())
}

fn read_param(env: &mut JNIEnv, param: &JString) -> String {
    if param.is_null() {
        return String::new();
    }
    param_or_empty(env.get_string(param).map(String::from))
}

fn context(function: &str) -> Option<&'static JniContext> {
    let context = CONTEXT.get();
    if context.is_none() {
        tracing::error!(target: "ffi", function, "called before JNI_OnLoad");
    }
    context
}

/// Run an exported function body, turning a panic into `fallback`.
fn ffi_guard<R>(function: &str, fallback: R, body: impl FnOnce() -> R) -> R {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => value,
        Err(_) => {
            tracing::error!(target: "ffi", function, "panic caught at JNI boundary");
            fallback
        }
    }
}

#[no_mangle]
pub extern "system" fn JNI_OnLoad(vm: JavaVM, _reserved: *mut c_void) -> jint {
    ffi_guard("JNI_OnLoad", JNI_ERR, || {
        if CONTEXT.get().is_some() {
            return JNI_VERSION_1_6;
        }

        match JniContext::load(vm) {
            Ok(context) => {
                let _ = CONTEXT.set(context);
                tracing::info!(target: "ffi", "native library loaded");
                JNI_VERSION_1_6
            }
            Err(e) => {
                tracing::error!(target: "ffi", error = %e, "JNI_OnLoad failed");
                JNI_ERR
            }
        }
    })
}

#[no_mangle]
pub extern "system" fn Java_com_example_hellojnicallback_MainActivity_stringFromJNI<'local>(
    env: JNIEnv<'local>,
    _this: JObject<'local>,
) -> jstring {
    ffi_guard("stringFromJNI", ptr::null_mut(), || match env.new_string(greeting()) {
        Ok(text) => text.into_raw(),
        Err(e) => {
            tracing::error!(target: "ffi", error = %e, "could not create greeting string");
            ptr::null_mut()
        }
    })
}

#[no_mangle]
pub extern "system" fn Java_com_example_hellojnicallback_MainActivity_startTicks<'local>(
    mut env: JNIEnv<'local>,
    instance: JObject<'local>,
    param: JString<'local>,
) {
    ffi_guard("startTicks", (), || {
        let Some(context) = context("startTicks") else {
            return;
        };
        let param = read_param(&mut env, &param);
        if let Err(e) = context.start_ticks(&mut env, &instance, &param) {
            tracing::error!(target: "ffi", error = %e, "startTicks failed");
        }
    })
}

#[no_mangle]
pub extern "system" fn Java_com_example_hellojnicallback_MainActivity_StopTicks<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
) {
    ffi_guard("StopTicks", (), || {
        if let Some(context) = context("StopTicks") {
            context.stop_ticks();
        }
    })
}

#[no_mangle]
pub extern "system" fn Java_com_example_hellojnicallback_MainActivity_createThread<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    param: JString<'local>,
) {
    ffi_guard("createThread", (), || {
        let Some(context) = context("createThread") else {
            return;
        };
        let param = read_param(&mut env, &param);
        // Detached: nobody joins the auxiliary thread
        if let Err(e) = context.controller.create_thread(&param) {
            tracing::error!(target: "ffi", error = %e, "createThread failed");
        }
    })
}
