use crate::WorldArgs;
use clap::Args;
use lithdat::{SectionData, SectionKind, WorldDocument};
use lithdat_utils::{ok, AnyResult};

#[derive(Args)]
pub struct InfoCommand {
    #[command(flatten)]
    pub world: WorldArgs,
}

impl crate::Command for InfoCommand {
    fn run(self) -> AnyResult {
        let world = self.world.load()?;
        let header = &world.header;

        println!("{}", self.world.file.display());
        println!("  version:  {}", header.version);
        println!("  packer:   {} (version {})", header.packer_type, header.packer_version);
        let info = summarize(&world.info, |i| {
            format!("\"{}\", extents {} .. {}", i.properties, i.extents_min, i.extents_max)
        });
        let tree = summarize(&world.world_tree, |t| {
            format!("{} world models, {} tree nodes", t.world_models.len(), t.sub_node_count)
        });
        println!("  info:     {info}");
        println!("  world tree: {tree}");

        for &kind in SectionKind::ALL {
            println!(
                "  {:<18} @ {:>10}: {}",
                kind.label(),
                header.section_offset(kind),
                section_summary(&world, kind)
            );
        }

        if !world.warnings.is_empty() {
            println!("  {} warnings", world.warnings.len());
        }
        ok()
    }
}

fn section_summary(world: &WorldDocument, kind: SectionKind) -> String {
    match kind {
        SectionKind::WorldObjects => format!("{} objects", world.world_objects.len()),
        SectionKind::BlindObjects => format!("{} objects", world.blind_objects.len()),
        SectionKind::LightGrid => summarize(&world.light_grid, |g| {
            let [x, y, z] = g.lookup_size;
            format!("{x}x{y}x{z} blocks, {} bytes compressed", g.data.len())
        }),
        SectionKind::Collision => {
            summarize(&world.collision, |c| format!("{} polygons", c.polygons.len()))
        }
        SectionKind::ParticleBlockers => summarize(&world.particle_blockers, |c| {
            format!("{} polygons", c.polygons.len())
        }),
        SectionKind::RenderData => summarize(&world.render_data, |r| {
            format!(
                "{} nodes, {} world model nodes, {} light groups",
                r.nodes.len(),
                r.world_models.len(),
                r.light_groups.len()
            )
        }),
    }
}

fn summarize<T>(section: &SectionData<T>, f: impl FnOnce(&T) -> String) -> String {
    match section {
        SectionData::Decoded(value) => f(value),
        SectionData::Deferred(deferred) => match deferred.prefix {
            Some(count) => format!("deferred ({count} elements)"),
            None => "deferred".to_string(),
        },
    }
}
