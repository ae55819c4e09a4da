//! WAT plugin fixtures for tests.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use flate2::Compression;
use flate2::write::DeflateEncoder;
use rawzip::CompressionMethod;

use crate::manifest::{PLUGIN_MANIFEST_FILE_NAME, PluginManifest, PluginMetadata};

/// Writer whose contents stay readable after it is boxed away.
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Clone, Copy)]
pub(crate) enum Behavior {
    /// Reads a line and writes `echo: <line>\n`; status 2 at end of input.
    Echo,
    /// Returns the given status without doing anything.
    Status(i32),
    /// Hits `unreachable`.
    Trap,
    /// Exports an `_init` that succeeds.
    InitOk,
    /// Exports an `_init` that returns 1.
    InitFails,
    /// Exports `_describe` but no `_execute`.
    NoExecute,
    /// Succeeds on its first run and fails on every later run.
    Counter,
    /// Asks for a line into a buffer past the end of memory.
    BadRead,
}

pub(crate) struct FixtureCommand {
    id: &'static str,
    description: &'static str,
    behavior: Behavior,
}

impl FixtureCommand {
    pub(crate) fn new(id: &'static str, description: &'static str, behavior: Behavior) -> Self {
        Self {
            id,
            description,
            behavior,
        }
    }
}

const ECHO_PREFIX_AT: u32 = 0;
const NEWLINE_AT: u32 = 8;
const COUNTER_AT: u32 = 16;
const DESCRIPTIONS_AT: u32 = 1024;
const INPUT_AT: u32 = 8192;
const INPUT_CAP: u32 = 1024;

/// Builds a WAT module implementing the given commands.
pub(crate) fn module_wat(commands: &[FixtureCommand]) -> String {
    let mut wat = String::new();
    wat.push_str("(module\n");
    wat.push_str("  (import \"conch\" \"write\" (func $write (param i32 i32)))\n");
    wat.push_str("  (import \"conch\" \"read_line\" (func $read_line (param i32 i32) (result i32)))\n");
    wat.push_str("  (memory (export \"memory\") 1)\n");
    writeln!(wat, "  (data (i32.const {ECHO_PREFIX_AT}) \"echo: \")").unwrap();
    writeln!(wat, "  (data (i32.const {NEWLINE_AT}) \"\\n\")").unwrap();

    for (index, command) in commands.iter().enumerate() {
        let offset = DESCRIPTIONS_AT + 256 * index as u32;
        let packed = ((offset as u64) << 32) | command.description.len() as u64;
        let id = command.id;

        writeln!(
            wat,
            "  (data (i32.const {offset}) \"{}\")",
            command.description.replace('\\', "\\\\").replace('"', "\\\"")
        )
        .unwrap();
        writeln!(
            wat,
            "  (func (export \"{id}_describe\") (result i64) (i64.const {packed}))"
        )
        .unwrap();

        let written = match command.behavior {
            Behavior::Echo => writeln!(
                wat,
                "  (func (export \"{id}_execute\") (result i32)
    (local $n i32)
    (local.set $n (call $read_line (i32.const {INPUT_AT}) (i32.const {INPUT_CAP})))
    (if (i32.lt_s (local.get $n) (i32.const 0))
      (then (return (i32.const 2))))
    (call $write (i32.const {ECHO_PREFIX_AT}) (i32.const 6))
    (call $write (i32.const {INPUT_AT}) (local.get $n))
    (call $write (i32.const {NEWLINE_AT}) (i32.const 1))
    (i32.const 0))"
            ),
            Behavior::Status(status) => writeln!(
                wat,
                "  (func (export \"{id}_execute\") (result i32) (i32.const {status}))"
            ),
            Behavior::Trap => writeln!(
                wat,
                "  (func (export \"{id}_execute\") (result i32) unreachable)"
            ),
            Behavior::InitOk | Behavior::InitFails => {
                let status = if matches!(command.behavior, Behavior::InitOk) { 0 } else { 1 };
                writeln!(
                    wat,
                    "  (func (export \"{id}_init\") (result i32) (i32.const {status}))
  (func (export \"{id}_execute\") (result i32) (i32.const 0))"
                )
            }
            Behavior::NoExecute => Ok(()),
            Behavior::Counter => writeln!(
                wat,
                "  (func (export \"{id}_execute\") (result i32)
    (if (i32.load (i32.const {COUNTER_AT}))
      (then (return (i32.const 1))))
    (i32.store (i32.const {COUNTER_AT}) (i32.const 1))
    (i32.const 0))"
            ),
            Behavior::BadRead => writeln!(
                wat,
                "  (func (export \"{id}_execute\") (result i32)
    (drop (call $read_line (i32.const 70000) (i32.const {INPUT_CAP})))
    (i32.const 0))"
            ),
        };
        written.unwrap();
    }

    wat.push_str(")\n");
    wat
}

/// Writes `<parent>/<name>/plugin.json` and `plugin.wat`; returns the plugin
/// directory.
pub(crate) fn write_plugin(parent: &Path, name: &str, commands: &[FixtureCommand]) -> PathBuf {
    let dir = parent.join(name);
    fs::create_dir_all(&dir).unwrap();

    let mut manifest = PluginManifest {
        plugin: PluginMetadata::new(name, "1.0.0").with_wasm("plugin.wat"),
        commands: Vec::new(),
    };
    for command in commands {
        manifest = manifest.with_command(command.id);
    }

    fs::write(dir.join(PLUGIN_MANIFEST_FILE_NAME), manifest.to_json().unwrap()).unwrap();
    fs::write(dir.join("plugin.wat"), module_wat(commands)).unwrap();
    dir
}

/// Writes a zip archive with every entry compressed using `method`.
pub(crate) fn write_zip(path: &Path, entries: &[(&str, &[u8])], method: CompressionMethod) {
    let mut output = Vec::new();
    let mut archive = rawzip::ZipArchiveWriter::new(&mut output);

    for (name, data) in entries {
        let (mut entry, config) = archive
            .new_file(name)
            .compression_method(method)
            .start()
            .unwrap();

        if method == CompressionMethod::Deflate {
            let encoder = DeflateEncoder::new(&mut entry, Compression::default());
            let mut writer = config.wrap(encoder);
            writer.write_all(data).unwrap();
            let (encoder, descriptor) = writer.finish().unwrap();
            encoder.finish().unwrap();
            entry.finish(descriptor).unwrap();
        } else {
            let mut writer = config.wrap(&mut entry);
            writer.write_all(data).unwrap();
            let (_, descriptor) = writer.finish().unwrap();
            entry.finish(descriptor).unwrap();
        }
    }

    archive.finish().unwrap();
    fs::write(path, output).unwrap();
}
