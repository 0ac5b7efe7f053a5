use clap::{ArgAction, Parser};
use qtatom::{Atom, AtomReader, FourCC, PayloadData, ReadAt, Registry, default_registry};
use serde::Serialize;
use std::fs::File;

#[derive(Parser, Debug)]
#[command(version, about = "Print the atom tree of a QuickTime/MP4 file")]
struct Args {
    /// Movie file path
    path: String,

    /// Emit JSON instead of the human-readable tree
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

// Container policy lives here, not in the core: these are the types whose
// payload is itself a sequence of atoms.
fn is_container(typ: FourCC) -> bool {
    matches!(
        &typ.0,
        b"moov" | b"trak" | b"mdia" | b"minf" | b"stbl" | b"dinf" | b"tref"
    )
}

fn print_payload(data: &PayloadData, indent: usize) {
    match data {
        PayloadData::MediaHeader(d) => {
            println!("{:indent$}time scale: {}", "", d.time_scale);
            println!("{:indent$}duration: {}", "", d.duration);
        }
        PayloadData::HandlerReference(d) => {
            println!("{:indent$}component type: {}", "", d.component_type);
            println!("{:indent$}component subtype: {}", "", d.component_subtype);
        }
        PayloadData::ChunkOffset(d) => {
            println!("{:indent$}number of entries: {}", "", d.entry_count);
            if let Some(first) = d.offsets.first() {
                println!("{:indent$}first chunk offset: {}", "", first);
            }
        }
        PayloadData::ChunkOffset64(d) => {
            println!("{:indent$}number of entries: {}", "", d.entry_count);
            if let Some(first) = d.offsets.first() {
                println!("{:indent$}first chunk offset: {}", "", first);
            }
        }
        PayloadData::SampleSize(d) => {
            if d.constant_sample_size != 0 {
                println!("{:indent$}constant sample size: {}", "", d.constant_sample_size);
            } else {
                println!("{:indent$}number of entries: {}", "", d.sample_count);
                if let Some(first) = d.sample_sizes.first() {
                    println!("{:indent$}first sample size: {}", "", first);
                }
            }
        }
        PayloadData::SampleToChunk(d) => {
            println!("{:indent$}number of entries: {}", "", d.entry_count);
            if let Some(first) = d.entries.first() {
                println!(
                    "{:indent$}first run: chunk {} x {} samples",
                    "", first.first_chunk, first.samples_per_chunk
                );
            }
        }
    }
}

// Recursion goes through `dyn ReadAt` so nesting depth is a runtime matter,
// not a pile-up of `Section<Section<..>>` instantiations.
fn tree(src: &dyn ReadAt, reg: &Registry, indent: usize) -> anyhow::Result<()> {
    let mut atoms = AtomReader::new(src);
    while let Some(atom) = atoms.next() {
        println!("{:indent$}{} ({} bytes)", "", atom.typ, atom.size);
        if is_container(atom.typ) {
            tree(&atom.data, reg, indent + 2)?;
        } else if let Some(decoded) = reg.decode(&atom) {
            print_payload(&decoded?, indent + 2);
        }
    }
    if let Some(err) = atoms.error() {
        anyhow::bail!("parse error: {err}");
    }
    Ok(())
}

/// JSON-serializable tree node.
#[derive(Serialize)]
struct Node {
    typ: String,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<PayloadData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<Vec<Node>>,
}

fn collect(src: &dyn ReadAt, reg: &Registry) -> anyhow::Result<Vec<Node>> {
    let mut out = Vec::new();
    let mut atoms = AtomReader::new(src);
    while let Some(atom) = atoms.next() {
        out.push(node(&atom, reg)?);
    }
    if let Some(err) = atoms.error() {
        anyhow::bail!("parse error: {err}");
    }
    Ok(out)
}

fn node<'a>(atom: &Atom<'a, dyn ReadAt + 'a>, reg: &Registry) -> anyhow::Result<Node> {
    let (payload, children) = if is_container(atom.typ) {
        (None, Some(collect(&atom.data, reg)?))
    } else {
        (reg.decode(atom).transpose()?, None)
    };
    Ok(Node {
        typ: atom.typ.to_string(),
        size: atom.size,
        payload,
        children,
    })
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let f = File::open(&args.path)?;
    let reg = default_registry();

    if args.json {
        let nodes = collect(&f, &reg)?;
        println!("{}", serde_json::to_string_pretty(&nodes)?);
    } else {
        tree(&f, &reg, 0)?;
    }
    Ok(())
}
