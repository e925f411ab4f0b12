//! The tiny C runtime linked alongside generated assembly.
//!
//! The assembly contract (spec §6.5) promises `print_int`, `print_bool`
//! and `read_int` as externs with the System V calling convention. Rather
//! than hand-writing those three functions in assembly, they're a few
//! lines of C, compiled and linked in the same `cc` invocation as the
//! generated `.s` file — one shelled-out command, no separate archive or
//! `build.rs` step, the same one-shot shape as the teacher's
//! `clang <ir> -o <out>` in `lib.rs::compile_file_with_config`.

pub const RUNTIME_SOURCE: &str = r#"
#include <stdio.h>
#include <stdlib.h>

void print_int(long n) {
    printf("%ld\n", n);
}

void print_bool(long b) {
    fputs(b ? "true\n" : "false\n", stdout);
}

long read_int(void) {
    long n;
    if (scanf("%ld", &n) != 1) {
        fprintf(stderr, "read_int: expected an integer on stdin\n");
        exit(1);
    }
    return n;
}
"#;

/// Writes [`RUNTIME_SOURCE`] to a fresh temp file and returns its path.
/// Callers are responsible for removing it once the link step is done.
pub fn write_to_temp_file() -> Result<std::path::PathBuf, String> {
    let path = std::env::temp_dir().join(format!("pebble_runtime_{}.c", std::process::id()));
    std::fs::write(&path, RUNTIME_SOURCE)
        .map_err(|e| format!("failed to write runtime source: {e}"))?;
    Ok(path)
}
