use std::path::PathBuf;

use project_porter::cli::*;
use speculate2::speculate;

speculate! {
    describe "parse_tokens" {
        it "parses all three flags in any order" {
            let invocation = parse_tokens(&["/path:/tmp/exports", "/project:Web Portal", "/action:export"])
                .expect("Failed to parse");

            assert_eq!(invocation, Invocation {
                action: Action::Export,
                project: "Web Portal".to_string(),
                path: PathBuf::from("/tmp/exports"),
            });
        }

        it "splits on the first colon only" {
            let invocation = parse_tokens(&["/action:IMPORT", "/project:Web", r"/path:C:\exports"])
                .expect("Failed to parse");

            assert_eq!(invocation.action, Action::Import);
            assert_eq!(invocation.path, PathBuf::from(r"C:\exports"));
        }

        it "rejects the wrong number of arguments" {
            let result = parse_tokens(&["/action:export", "/project:Web"]);
            assert_eq!(result, Err(UsageError::WrongCount(2)));
        }

        it "rejects unknown flags" {
            let result = parse_tokens(&["/action:export", "/project:Web", "/dir:/tmp"]);
            assert_eq!(result, Err(UsageError::UnknownFlag("/dir".to_string())));
        }

        it "rejects flags without a value" {
            let result = parse_tokens(&["/action", "/project:Web", "/path:/tmp"]);
            assert_eq!(result, Err(UsageError::MissingValue("/action".to_string())));

            let result = parse_tokens(&["/action:", "/project:Web", "/path:/tmp"]);
            assert_eq!(result, Err(UsageError::MissingValue("/action".to_string())));
        }

        it "rejects repeated flags" {
            let result = parse_tokens(&["/action:export", "/action:import", "/path:/tmp"]);
            assert_eq!(result, Err(UsageError::Duplicate("/action".to_string())));
        }

        it "rejects unknown actions" {
            let result = parse_tokens(&["/action:sync", "/project:Web", "/path:/tmp"]);
            assert_eq!(result, Err(UsageError::UnknownAction("sync".to_string())));
        }
    }
}
