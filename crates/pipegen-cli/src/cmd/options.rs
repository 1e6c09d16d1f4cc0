use crate::output::{print_json, print_table};
use pipegen_core::types::{choice_sets, Choice};

pub fn run(json: bool) -> anyhow::Result<()> {
    let sets = choice_sets();
    if json {
        return print_json(&sets);
    }

    let groups: [(&str, &[Choice]); 4] = [
        ("ci-tool", sets.ci_tools.as_slice()),
        ("language", sets.languages.as_slice()),
        ("build-tool", sets.build_tools.as_slice()),
        ("target", sets.deployment_targets.as_slice()),
    ];
    let rows = groups
        .iter()
        .flat_map(|(option, choices)| {
            choices
                .iter()
                .map(move |c| vec![format!("--{option}"), c.id.to_string(), c.label.to_string()])
        })
        .collect();
    print_table(&["OPTION", "VALUE", "LABEL"], rows);
    Ok(())
}
