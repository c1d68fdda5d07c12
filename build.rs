use std::error::Error;
use std::path::Path;

use vergen::{BuildBuilder, CargoBuilder, Emitter, RustcBuilder};
use vergen_git2::Git2Builder;

// Emits VERGEN_* build metadata logged by the registry host at startup.
fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=build.rs");

    let build = BuildBuilder::all_build()?;
    let cargo = CargoBuilder::all_cargo()?;
    let rustc = RustcBuilder::all_rustc()?;

    let mut emitter = Emitter::default();
    emitter
        .add_instructions(&build)?
        .add_instructions(&cargo)?
        .add_instructions(&rustc)?;

    // Source tarballs have no repository; git fields are then simply absent.
    if Path::new(".git").exists() {
        println!("cargo:rerun-if-changed=.git/HEAD");
        let git = Git2Builder::all_git()?;
        emitter.add_instructions(&git)?;
    }

    emitter.emit()?;
    Ok(())
}
