// Interactive command loop, fdisk style: single-letter commands, prompts
// with computed defaults, validation errors printed and the loop resumed.

use anyhow::Result;
use partedit_core::{
    find_last_sector, find_part_index, find_start_sector, ImageContext, MbrScheme, PartType,
    Scheme, SchemeContext, SchemeKind, SectorStore,
};

use crate::prompt;

pub fn run(
    context: &mut SchemeContext,
    store: &mut dyn SectorStore,
    img: &ImageContext,
) -> Result<()> {
    match context.active_kind() {
        Some(SchemeKind::Gpt) => println!("GPT detected."),
        Some(SchemeKind::Mbr) => println!("MBR detected."),
        None => println!("No partition table found. Use 'o' or 'g' to create one."),
    }

    loop {
        println!();
        let Some(command) = prompt::read_command("Command (m for help): ")? else {
            return Ok(());
        };
        match command {
            'm' => help(),
            'p' => cmd_print(context, img),
            'o' => {
                context.create(img, SchemeKind::Mbr);
                println!("Created a new MBR partition table.");
            }
            'g' => {
                context.create(img, SchemeKind::Gpt);
                println!("Created a new GPT partition table with a protective MBR.");
            }
            'n' => cmd_add(context, img)?,
            'e' => cmd_resize(context, img)?,
            't' => cmd_set_type(context)?,
            'a' => cmd_toggle_bootable(context)?,
            'd' => cmd_delete(context)?,
            'w' => {
                context.save(store, img)?;
                println!("The partition table has been written to the image.");
            }
            'q' => return Ok(()),
            other => println!("{other}: unknown command (m for help)"),
        }
    }
}

fn help() {
    println!("Commands:");
    println!("  m   print this help");
    println!("  p   print the partition table");
    println!("  o   create a new empty MBR partition table");
    println!("  g   create a new empty GPT partition table");
    println!("  n   add a new partition");
    println!("  e   move or resize a partition");
    println!("  t   change a partition type");
    println!("  a   toggle the bootable flag (MBR only)");
    println!("  d   delete a partition");
    println!("  w   write the partition table(s) to the image");
    println!("  q   quit without saving");
}

/// Picks a partition index, defaulting to the first slot matching `used`.
fn pick_index(scheme: &Scheme, used: bool) -> Result<Option<usize>> {
    let Some(default) = find_part_index(scheme, used) else {
        if used {
            println!("No partition is in use");
        } else {
            println!("All partition slots are in use");
        }
        return Ok(None);
    };
    let max = scheme.part_count() as u64 - 1;
    Ok(prompt::read_number("Partition number", 0, max, default as u64)?.map(|i| i as usize))
}

fn no_scheme() {
    println!("No partition table present; create one with 'o' or 'g' first");
}

fn cmd_add(context: &mut SchemeContext, img: &ImageContext) -> Result<()> {
    let Some(scheme) = context.active() else {
        no_scheme();
        return Ok(());
    };
    let Some(index) = pick_index(scheme, false)? else {
        return Ok(());
    };
    let Some(start_default) = find_start_sector(scheme, img, Some(index)) else {
        println!("No free sectors left");
        return Ok(());
    };
    let first = scheme.first_usable_lba();
    let last = scheme.last_usable_lba();
    let Some(start) = prompt::read_number("First sector", first, last, start_default)? else {
        return Ok(());
    };
    let end_default = find_last_sector(scheme, img, Some(index), start).unwrap_or(last);
    let Some(end) = prompt::read_number("Last sector", start, last, end_default)? else {
        return Ok(());
    };

    match context.active_mut().unwrap().add_partition(index, start, end) {
        Ok(()) => println!("Created partition {index} ({} sectors).", end - start + 1),
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn cmd_resize(context: &mut SchemeContext, img: &ImageContext) -> Result<()> {
    let Some(scheme) = context.active() else {
        no_scheme();
        return Ok(());
    };
    let Some(index) = pick_index(scheme, true)? else {
        return Ok(());
    };
    if !scheme.part_is_used(index) {
        println!("Partition {index} is not in use");
        return Ok(());
    }
    let first = scheme.first_usable_lba();
    let last = scheme.last_usable_lba();
    let start_default = find_start_sector(scheme, img, Some(index)).unwrap_or(first);
    let Some(start) = prompt::read_number("First sector", first, last, start_default)? else {
        return Ok(());
    };
    let end_default = find_last_sector(scheme, img, Some(index), start).unwrap_or(last);
    let Some(end) = prompt::read_number("Last sector", start, last, end_default)? else {
        return Ok(());
    };

    match context
        .active_mut()
        .unwrap()
        .resize_partition(index, start, end)
    {
        Ok(()) => println!("Partition {index} now spans sectors {start}..={end}."),
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn cmd_set_type(context: &mut SchemeContext) -> Result<()> {
    let Some(scheme) = context.active() else {
        no_scheme();
        return Ok(());
    };
    let Some(index) = pick_index(scheme, true)? else {
        return Ok(());
    };
    if !scheme.part_is_used(index) {
        println!("Partition {index} is not in use");
        return Ok(());
    }

    let ptype = match scheme.parts()[index].ptype {
        PartType::Mbr(current) => {
            let Some(byte) = prompt::read_hex_byte("Partition type", current)? else {
                return Ok(());
            };
            PartType::Mbr(byte)
        }
        PartType::Gpt(current) => {
            let Some(guid) = prompt::read_guid("Partition type GUID", current)? else {
                return Ok(());
            };
            PartType::Gpt(guid)
        }
    };

    match context.active_mut().unwrap().set_type(index, ptype) {
        Ok(()) => println!("Changed the type of partition {index}."),
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn cmd_toggle_bootable(context: &mut SchemeContext) -> Result<()> {
    let Some(scheme) = context.active() else {
        no_scheme();
        return Ok(());
    };
    if scheme.kind() != SchemeKind::Mbr {
        println!("The bootable flag only applies to MBR partition tables");
        return Ok(());
    }
    let Some(index) = pick_index(scheme, true)? else {
        return Ok(());
    };

    match context.active_mut().unwrap().toggle_bootable(index) {
        Ok(()) => {
            let bootable = context.active().unwrap().parts()[index].boot_ind & 0x80 != 0;
            println!(
                "Partition {index} is {} bootable.",
                if bootable { "now" } else { "no longer" }
            );
        }
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn cmd_delete(context: &mut SchemeContext) -> Result<()> {
    let Some(scheme) = context.active() else {
        no_scheme();
        return Ok(());
    };
    let Some(index) = pick_index(scheme, true)? else {
        return Ok(());
    };

    match context.active_mut().unwrap().delete_partition(index) {
        Ok(()) => println!("Deleted partition {index}."),
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn cmd_print(context: &SchemeContext, img: &ImageContext) {
    let Some(scheme) = context.active() else {
        println!("No partition table present");
        return;
    };

    match scheme {
        Scheme::Mbr(mbr) => print_mbr_summary(mbr),
        Scheme::Gpt(gpt) => {
            println!("Disklabel type: gpt");
            println!("Disk identifier: {}", gpt.disk_guid());
        }
    }
    println!("First usable LBA: {}", scheme.first_usable_lba());
    println!("Last usable LBA:  {}", scheme.last_usable_lba());
    if context.gpt().is_some() && context.mbr().is_some() {
        println!("Protective MBR:   present");
    }

    let mut any = false;
    for (index, part) in scheme.parts().iter().enumerate() {
        if !part.is_used() {
            continue;
        }
        any = true;
        println!();
        println!("Partition {index}:");
        match part.ptype {
            PartType::Mbr(ptype) => {
                println!("  Type:        0x{ptype:02X}");
                println!(
                    "  Bootable:    {}",
                    if part.boot_ind & 0x80 != 0 { "yes" } else { "no" }
                );
            }
            PartType::Gpt(type_guid) => {
                println!("  Type GUID:   {type_guid}");
                println!("  Unique GUID: {}", part.unique_guid);
                if part.attributes != 0 {
                    println!("  Attributes:  0x{:016X}", part.attributes);
                }
                let name = decode_name(&part.name);
                if !name.is_empty() {
                    println!("  Name:        {name}");
                }
            }
        }
        println!("  Start LBA:   {}", part.start_lba);
        println!("  End LBA:     {}", part.end_lba);
        println!("  Sectors:     {}", part.sectors());
        if let PartType::Mbr(ptype) = part.ptype {
            let protective = ptype == 0xEE;
            let start = img.lba_to_chs(part.start_lba, protective);
            let end = img.lba_to_chs(part.end_lba, protective);
            println!(
                "  Start C/H/S: {}/{}/{}",
                start.cylinder, start.head, start.sector
            );
            println!("  End C/H/S:   {}/{}/{}", end.cylinder, end.head, end.sector);
        }
    }
    if !any {
        println!("\nNo partitions.");
    }
}

fn print_mbr_summary(mbr: &MbrScheme) {
    println!("Disklabel type: dos");
    println!("Disk identifier: 0x{:08x}", mbr.disk_sig);
}

/// UCS-2 name up to the first NUL, lossily decoded.
fn decode_name(units: &[u16]) -> String {
    let len = units.iter().position(|&u| u == 0).unwrap_or(units.len());
    String::from_utf16_lossy(&units[..len])
}
