use std::{
    env,
    error::Error,
    fs::{self, File},
    io::Write,
    path::PathBuf,
    process,
};

struct OutcomeDef {
    /// The process exit code. This must remain stable between releases
    /// because build servers branch on it.
    code: u8,
    /// The internal name that this outcome is known as.
    name: String,
    /// A message describing the outcome.
    message: String,
}

fn create_outcomes() -> Result<(), Box<dyn Error>> {
    // Tell Cargo that if the outcome definitions change, to rerun this build script.
    println!("cargo:rerun-if-changed=resources/exit-codes.csv");

    let mut src_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    src_path.push("resources");
    src_path.push("exit-codes.csv");

    let src = fs::read_to_string(&src_path)
        .map_err(|e| format!("Unable to read '{}': {}", src_path.display(), e))?;

    let mut defs = vec![];
    let mut rdr = csv::Reader::from_reader(src.as_bytes());
    for result in rdr.records() {
        let record = result?;
        let code = record
            .get(0)
            .ok_or_else(|| format!("Record {:?} is not valid at column 0", record))?;
        let code: u8 = code
            .trim()
            .parse()
            .map_err(|e| format!("Record {:?} has invalid code: {}", record, e))?;
        let name = record
            .get(1)
            .ok_or_else(|| format!("Record {:?} is not valid at column 1", record))?;
        let message = record
            .get(2)
            .ok_or_else(|| format!("Record {:?} is not valid at column 2", record))?;

        if defs.iter().any(|def: &OutcomeDef| def.code == code) {
            return Err(format!("Code {} is defined more than once", code).into());
        }

        defs.push(OutcomeDef {
            code,
            name: name.trim().to_string(),
            message: message.trim().to_string(),
        });
    }

    let mut out_path = PathBuf::from(env::var("OUT_DIR")?);
    fs::create_dir_all(out_path.clone())
        .map_err(|e| format!("Unable to create output directory: {}", e))?;

    out_path.push("outcomes.rs");
    let mut out =
        File::create(out_path).map_err(|e| format!("Unable to create 'outcomes.rs': {}", e))?;

    // Create the enumeration definition
    out.write_all(b"/// The terminal outcome of a run. Each outcome maps to one process exit code.\n")?;
    out.write_all(b"#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]\n")?;
    out.write_all(b"pub enum Outcome {\n")?;
    for def in &defs {
        out.write_all(format!("    {},\n", def.name).as_bytes())?;
    }
    out.write_all(b"}\n\n")?;

    out.write_all(b"impl Outcome {\n")?;

    // Define ALL
    out.write_all(b"    /// Every outcome, ordered by code.\n")?;
    out.write_all(b"    pub const ALL: &'static [Outcome] = &[\n")?;
    for def in &defs {
        out.write_all(format!("        Outcome::{},\n", def.name).as_bytes())?;
    }
    out.write_all(b"    ];\n\n")?;

    // Define code()
    out.write_all(b"    /// Returns the process exit code for the outcome.\n")?;
    out.write_all(b"    pub fn code(&self) -> u8 {\n")?;
    out.write_all(b"        match self {\n")?;
    for def in &defs {
        out.write_all(
            format!("            Outcome::{} => {},\n", def.name, def.code).as_bytes(),
        )?;
    }
    out.write_all(b"        }\n")?;
    out.write_all(b"    }\n\n")?;

    // Define name()
    out.write_all(b"    /// Returns the name of the outcome.\n")?;
    out.write_all(b"    pub fn name(&self) -> &'static str {\n")?;
    out.write_all(b"        match self {\n")?;
    for def in &defs {
        out.write_all(
            format!("            Outcome::{} => \"{}\",\n", def.name, def.name).as_bytes(),
        )?;
    }
    out.write_all(b"        }\n")?;
    out.write_all(b"    }\n\n")?;

    // Define message()
    out.write_all(b"    /// Returns the message for the outcome.\n")?;
    out.write_all(b"    pub fn message(&self) -> &'static str {\n")?;
    out.write_all(b"        match self {\n")?;
    for def in &defs {
        out.write_all(
            format!(
                "            Outcome::{} => \"{}\",\n",
                def.name,
                def.message.escape_default()
            )
            .as_bytes(),
        )?;
    }
    out.write_all(b"        }\n")?;
    out.write_all(b"    }\n")?;

    out.write_all(b"}\n")?;

    out.flush()?;

    Ok(())
}

fn main() {
    if let Err(err) = create_outcomes() {
        println!("problem generating outcomes.rs: {}", err);
        process::exit(1);
    }
}
