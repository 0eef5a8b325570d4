//! Resolution against the real process environment.
//!
//! This binary holds a single test so that no other thread reads the
//! environment while it is being modified.

use flag_resolver_core::*;
use serde_json::{Value, json};

fn resolve_env(app: &Application, flag: &str) -> Option<Value> {
    let ctx = Context::new(app);
    let flag = app.find_flag(flag).expect("flag declared in schema");
    env_resolver()
        .resolve(&ctx, ctx.leaf(), flag)
        .expect("env resolver never fails")
}

#[test]
fn env_resolver_reads_process_environment() {
    let app = Application::new("svc")
        .with_flag(Flag::new("set").with_env("FLAG_RESOLVER_IT_SET"))
        .with_flag(Flag::new("blank").with_env("FLAG_RESOLVER_IT_BLANK"))
        .with_flag(Flag::new("unset").with_env("FLAG_RESOLVER_IT_UNSET"))
        .with_flag(Flag::new("unbound"));

    // SAFETY: this is the only test in the binary, so no other thread
    // touches the environment concurrently.
    unsafe {
        std::env::set_var("FLAG_RESOLVER_IT_SET", "bar");
        std::env::set_var("FLAG_RESOLVER_IT_BLANK", "");
        std::env::remove_var("FLAG_RESOLVER_IT_UNSET");
    }

    assert_eq!(resolve_env(&app, "set"), Some(json!("bar")));
    assert_eq!(resolve_env(&app, "blank"), None);
    assert_eq!(resolve_env(&app, "unset"), None);
    assert_eq!(resolve_env(&app, "unbound"), None);

    #[cfg(unix)]
    {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let app = Application::new("svc")
            .with_flag(Flag::new("bytes").with_env("FLAG_RESOLVER_IT_NOT_UTF8"));
        // SAFETY: see above.
        unsafe {
            std::env::set_var("FLAG_RESOLVER_IT_NOT_UTF8", OsStr::from_bytes(b"\xff"));
        }

        assert_eq!(ProcessEnv.lookup("FLAG_RESOLVER_IT_NOT_UTF8"), None);
        assert_eq!(resolve_env(&app, "bytes"), None);
    }
}
