//! `opaef tree`: build and print the grouping tree.

use std::path::PathBuf;

use opaef_ledger::{build_recognition_tree, build_tree};

use crate::output::{load_grouping, load_ledger, to_json, write_output, Meta};
use crate::render::render_tree;
use crate::CliError;

pub(crate) struct TreeArgs {
    pub ledger: PathBuf,
    pub config: Option<PathBuf>,
    pub recognition: bool,
    pub write_offs: bool,
    pub json: bool,
    pub output: Option<PathBuf>,
}

pub(crate) fn cmd_tree(args: TreeArgs) -> Result<(), CliError> {
    let document = load_ledger(&args.ledger)?;
    let config = load_grouping(args.config.as_deref())?;

    if args.recognition && !config.group_by_year {
        tracing::warn!("--recognition has no effect without group_by_year");
    }

    let write_offs;
    let records = if args.write_offs {
        write_offs = document.write_off_records();
        &write_offs
    } else {
        &document.records
    };

    let tree = if args.recognition {
        build_recognition_tree(records, &config)
    } else {
        build_tree(records, &config)
    };

    if args.json || args.output.is_some() {
        let json = to_json(&Meta::new(&args.ledger, &document), "tree", &tree)?;
        if let Some(ref path) = args.output {
            write_output(path, &json)?;
        }
        if args.json {
            println!("{json}");
            return Ok(());
        }
    }

    print!("{}", render_tree(&tree, args.write_offs));
    eprintln!(
        "{}: {} records in {} groups",
        document.entity,
        tree.record_count,
        tree.leaf_count()
    );
    Ok(())
}
