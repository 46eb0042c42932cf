use crate::WorldArgs;
use clap::Args;
use lithdat::object::{Property, PropertyValue};
use lithdat_utils::{ok, AnyResult};

#[derive(Args)]
pub struct ObjectsCommand {
    #[command(flatten)]
    pub world: WorldArgs,
    /// Only lists objects of this type (case insensitive)
    #[arg(long = "type", short = 't')]
    pub object_type: Option<String>,
}

impl crate::Command for ObjectsCommand {
    fn run(self) -> AnyResult {
        let world = self.world.load()?;

        let objects = world.world_objects.iter().filter(|object| {
            self.object_type
                .as_deref()
                .map_or(true, |ty| object.object_type.eq_ignore_case(ty))
        });

        let mut count = 0;
        for object in objects {
            count += 1;
            match object.name() {
                Some(name) => println!("{} \"{}\"", object.object_type, name),
                None => println!("{}", object.object_type),
            }
            for property in &object.properties {
                println!("  {}", format_property(property));
            }
        }

        println!("{count} of {} objects", world.world_objects.len());
        ok()
    }
}

pub fn format_property(property: &Property) -> String {
    let value = match &property.value {
        PropertyValue::String(s) => format!("\"{s}\""),
        PropertyValue::Vector(v) => format!("{v}"),
        PropertyValue::Color(c) => format!("rgb({}, {}, {})", c.r, c.g, c.b),
        PropertyValue::Float(f) => format!("{f}"),
        PropertyValue::Bool(b) => format!("{b}"),
        PropertyValue::LongInt(n) => format!("{n}"),
        PropertyValue::Rotation(q) => format!("{q}"),
    };
    format!(
        "{}: {} = {value}",
        property.name,
        property.kind().name()
    )
}
