//! End-to-end extraction of miniature OZ and classic maps

use scmap::{
    miner_for, Assembler, Baseline, Catalog, CategoryRules, DamageTable, ExtractOptions, MapVariant,
    ScriptMiner,
};
use serde_json::{json, Value as JsonValue};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use w3data::{
    encode_fourcc, DirectorySource, PatchTable, RawTableStore, ScriptText, TextFormatter, Value,
};

fn field(id: &str, level: u32, value: impl Into<JsonValue>) -> JsonValue {
    json!({ "id": id, "type": "string", "level": level, "column": 0, "value": value.into() })
}

fn write_table(dir: &Path, ext: &str, custom: JsonValue) {
    let table = json!({ "original": {}, "custom": custom });
    std::fs::write(
        dir.join(format!("war3map.{ext}.json")),
        serde_json::to_string_pretty(&table).unwrap(),
    )
    .unwrap();
}

fn write_tables(dir: &Path) {
    write_table(
        dir,
        "w3u",
        json!({
            "h0F0": [
                field("unam", 0, "Castle"),
                field("uabi", 0, "Aur0,Adsc,At01,At02"),
                field("ures", 0, "Rup5"),
                field("upoi", 0, 150)
            ],
            "h0B0": [ field("unam", 0, "Barracks"), field("upoi", 0, 60) ],
            "h0T0": [ field("unam", 0, "Guard Tower"), field("ures", 0, "Rtw1") ],
            "n0BP": [ field("unam", 0, "Bonus Picker"), field("uupt", 0, "n0B1") ],
            "n0B1": [
                field("unam", 0, "Bonus Hall"),
                field("utip", 0, "Bonus One"),
                field("uhot", 0, "Q"),
                field("utub", 0, "More power"),
                field("ures", 0, "Rbn1"),
                field("uabi", 0, "Ab01,Ab02")
            ],
            "u0B0": [ field("unam", 0, "Bonus Knight") ],
            "H0B0": [ field("unam", 0, "Champion"), field("upro", 0, "Aldric") ],
            "H0H1": [ field("unam", 0, "Hero One"), field("upoi", 0, 100) ],
            "H0H2": [ field("unam", 0, "Hero Two") ],
            "H0H3": [ field("unam", 0, "Hero Three") ],
            "H0H4": [ field("unam", 0, "Hero Four"), field("upoi", 0, 400) ],
            "u0M0": [ field("unam", 0, "Footman"), field("upoi", 0, 12) ],
            "u0R0": [ field("unam", 0, "Archer") ],
            "u0G0": [ field("unam", 0, "Mage") ],
            "u0S0": [ field("unam", 0, "Ram") ],
            "u0A0": [ field("unam", 0, "Gryphon") ],
            "u0C0": [ field("unam", 0, "Catapult") ],
            "n0N0": [ field("unam", 0, "Golem"), field("uabi", 0, "Ans1") ]
        }),
    );

    write_table(
        dir,
        "w3a",
        json!({
            "PIC1": [ field("atp1", 1, "Alliance One"), field("apb1", 1, "Arc1") ],
            "Arc1": [ field("atp1", 1, "Race - Blood Elves [New]"), field("aub1", 1, "Proud elves") ],
            "Aur0": [ field("apb1", 1, "Aur1,Aur2") ],
            "Aur1": [ field("atp1", 1, "Aura of Light"), field("aub1", 1, "Heals") ],
            "Aur2": [ field("atp1", 1, "Aura of Might") ],
            "At01": [ field("atp1", 1, "Flame Strike") ],
            "At02": [ field("atp1", 1, "Phoenix") ],
            "Amg1": [ field("atp1", 1, "Fireball"), field("areq", 0, "Rmg0") ],
            "Ab01": [ field("atp1", 1, "Bonus Bolt") ],
            "Ab02": [ field("atp1", 1, "Bonus Shield") ],
            "U000": [ field("atp1", 1, "Power Ulti"), field("areq", 0, "Rup9"), field("arqa", 0, "2") ],
            "U001": [ field("atp1", 1, "Storm Ulti") ],
            "Asp0": [ field("atp1", 1, "Meteor") ],
            "Asp1": [ field("atp1", 1, "Storm") ],
            "Asp2": [ field("atp1", 1, "Big Meteor") ],
            "Ash1": [ field("atp1", 1, "Shrine of Haste") ],
            "Ash2": [ field("atp1", 1, "Shrine of Power") ],
            "Ans1": [
                field("atp1", 1, "Slam(Neutral)"),
                field("ahky", 0, "S"),
                field("aub1", 1, "Hits"),
                field("aub1", 2, "Hits harder")
            ]
        }),
    );

    write_table(
        dir,
        "w3q",
        json!({
            "Rup5": [ field("gnam", 0, "Steel Swords"), field("ghk1", 0, "A") ],
            "Rup2": [ field("gnam", 0, "Plating") ],
            "Rup3": [ field("gnam", 0, "Arrows") ],
            "Rup4": [ field("gnam", 0, "Walls") ],
            "Rtw1": [
                field("gnam", 0, "Tower Guard"),
                field("glvl", 0, 3),
                field("gglb", 0, 100),
                field("gglm", 0, 50)
            ],
            "Rmg0": [
                field("gnam", 0, "Magic"),
                field("glvl", 0, 2),
                field("gtp1", 1, "Magic I"),
                field("gtp1", 2, "Magic II"),
                field("gglb", 0, 200),
                field("gglm", 0, 50)
            ],
            "Rbn1": [ field("gnam", 0, "Bonus Research") ],
            "Rup9": [ field("gnam", 1, "Power (Tier 2) lv2") ]
        }),
    );

    write_table(
        dir,
        "w3t",
        json!({
            "I001": [ field("inam", 0, "Sword") ],
            "I002": [ field("inam", 0, "Shield") ],
            "I003": [ field("inam", 0, "Ring") ],
            "I00E": [ field("inam", 0, "Orb"), field("ilev", 0, 2) ]
        }),
    );
}

fn id(fourcc: &str) -> u32 {
    encode_fourcc(fourcc).unwrap()
}

fn oz_script() -> String {
    let mut lines = vec![
        "function InitRaces takes nothing returns nothing".to_string(),
        "local integer id=GetPickedRace()".to_string(),
        "if id==1 then".to_string(),
        format!("call Pick(pl,{})", id("Arc1")),
        "set nm=\"Blood Elves\"".to_string(),
        "call SetPlayerName(pl,nm)".to_string(),
        format!("call UnitRemoveAbility(pl,{})", id("Arc1")),
    ];
    let race_vars = [
        ("m", "h0F0"),
        ("Q", "h0B0"),
        ("U", "h0T0"),
        ("r", "Aur0"),
        ("k", "Adsc"),
        ("I", "n0BP"),
        ("N", "Rmg0"),
        ("V", "Rup1"),
        ("M", "Rup2"),
        ("B", "Rup3"),
        ("ww", "Rup4"),
        ("t", "H0H1"),
        ("i", "H0H2"),
        ("S", "H0H3"),
        ("c", "H0H4"),
        ("P", "u0M0"),
        ("A", "u0R0"),
        ("D", "u0G0"),
        ("H", "u0S0"),
        ("J", "u0A0"),
        ("K", "u0C0"),
    ];
    for (var, value) in race_vars {
        lines.push(format!("set {var}={}", id(value)));
    }
    lines.extend(["endif".to_string(), "endfunction".to_string()]);

    lines.extend([
        "function OnBonus takes nothing returns nothing".to_string(),
        format!("if typ=={} then", id("n0B1")),
        format!("set t[plyr]={}", id("H0B0")),
        format!("set P[plyr]={}", id("u0B0")),
        format!("call SetPlayerTechResearched(plyr,{},2)", id("Rbn1")),
        "endif".to_string(),
        "endfunction".to_string(),
    ]);

    lines.extend([
        "function HeroItems takes nothing returns nothing".to_string(),
        "local unit hu=GetTriggerUnit()".to_string(),
        format!("if GetUnitTypeId(hu)=={} then", id("H0B0")),
    ]);
    for (level, item) in [(5, "I001"), (10, "I002"), (3, "I003")] {
        lines.extend([
            format!("if GetHeroLevel(hu)>={level} then"),
            format!("call UnitAddItemById(hu,{})", id(item)),
            "endif".to_string(),
        ]);
    }
    lines.extend(["endif".to_string(), "endfunction".to_string()]);

    lines.extend([
        "function InitUltis takes nothing returns nothing".to_string(),
        format!("call RegU(plyr,{},{},\"Ulti One\")", id("U000"), id("Asp0")),
        format!("call RegU(plyr,{},{},\"Ulti Two\")", id("U001"), id("Asp1")),
        "endfunction".to_string(),
        "function PickUlti takes nothing returns nothing".to_string(),
        format!("if ulti=={} then", id("U000")),
        format!("set ulsp={}", id("Asp2")),
        "endif".to_string(),
        "endfunction".to_string(),
    ]);

    lines.extend([
        "function InitShrines takes nothing returns nothing".to_string(),
        format!("call AddS(sh,{},\"Shrine A\")", id("Ash1")),
        format!("call AddS(sh,{},\"Shrine B\")", id("Ash2")),
        format!("call AddS(sh,{},\"Shrine C\")", id("Ash1")),
        "endfunction".to_string(),
    ]);

    lines.extend([
        "function SpawnNeutrals takes nothing returns nothing".to_string(),
        "local integer array nu".to_string(),
    ]);
    for n in 0..9 {
        let neutral = if n == 0 { "n0N0" } else { "nzzz" };
        lines.push(format!("set nu[{n}]={}", id(neutral)));
    }
    lines.extend(["call Spawn(nu)".to_string(), "endfunction".to_string()]);

    let mut script = lines.join("\n");
    script.push('\n');
    script
}

fn load_catalog(dir: &Path, options: &ExtractOptions) -> Catalog {
    let store = RawTableStore::new(DirectorySource::new(dir), Arc::new(TextFormatter::default()));
    Catalog::load(&store, Baseline::default(), options.patch_table()).unwrap()
}

fn map_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_tables(dir.path());
    std::fs::write(dir.path().join("war3map.j"), oz_script()).unwrap();
    dir
}

#[test]
fn test_oz_extraction() {
    let dir = map_dir();
    let mut extra = PatchTable::new();
    extra.insert("u0M0", json!({ "hotkey": "M" }));
    let options = ExtractOptions::new(MapVariant::Oz).with_patches(extra);

    let catalog = load_catalog(dir.path(), &options);
    let script = ScriptText::load(&dir.path().join("war3map.j")).unwrap();
    let miner = miner_for(MapVariant::Oz, &script, &catalog).unwrap();
    let extraction = Assembler::new(&catalog, miner, DamageTable::default())
        .run()
        .unwrap();

    // Raw mining
    let raw = &extraction.raw;
    assert_eq!(raw.pickers.len(), 1);
    assert_eq!(raw.pickers["PIC1"], vec!["Arc1"]);
    let raw_race = raw.race("Arc1").unwrap();
    assert_eq!(raw_race.bonus_upgrades["n0B1"], vec![("Rbn1".to_string(), 2)]);
    assert_eq!(raw_race.bonus_heroes.len(), 1);
    assert_eq!(raw_race.bonus_heroes[0].slot, 0);
    assert_eq!(raw_race.bonus_heroes[0].id, "H0B0");

    // Race index
    let alliance = &extraction.races.data["Alliance One"];
    assert_eq!(alliance.len(), 1);
    assert_eq!(alliance[0].key, "blood_elves");
    assert_eq!(alliance[0].name, "Blood Elves");
    assert_eq!(alliance[0].description, "Race - Blood Elves [New]<br/>Proud elves");

    // Race document
    assert_eq!(extraction.race_files.len(), 1);
    let race = &extraction.race_files[0].data;
    assert_eq!(race.id, "Arc1");
    assert_eq!(race.t1spell.id, "At01");
    assert_eq!(race.t2spell.id, "At02");
    assert_eq!(race.buildings.fort.name, "Castle");
    assert_eq!(race.units.melee.hotkey.as_deref(), Some("M"));
    assert_eq!(race.units.catapult.name, "Catapult");

    assert_eq!(race.base_upgrades.melee.id, "Rup5");
    assert_eq!(race.base_upgrades.armor.id, "Rup2");
    assert_eq!(race.base_upgrades.wall.id, "Rup4");

    let auras: Vec<_> = race.auras.iter().map(|a| (a.name.as_str(), a.hotkey.as_deref())).collect();
    assert_eq!(auras, vec![("Aura of Light", Some("Q")), ("Aura of Might", Some("W"))]);

    assert_eq!(race.tower_upgrades.len(), 1);
    assert_eq!(race.tower_upgrades[0].cost, vec![100.0, 150.0]);
    assert_eq!(race.tower_upgrades[0].timers.as_ref().map(Vec::len), Some(2));

    let magic: Vec<_> = race.magic.iter().map(|m| (m.name.as_str(), m.level, m.cost.clone())).collect();
    assert_eq!(
        magic,
        vec![("Magic I", Some(1), vec![200.0]), ("Magic II", Some(2), vec![250.0])]
    );
    assert_eq!(race.magic[0].spells[0].id, "Amg1");

    let heroes: Vec<_> = race
        .heroes
        .iter()
        .map(|h| (h.unit.id.as_str(), h.unit.hotkey.as_deref()))
        .collect();
    assert_eq!(
        heroes,
        vec![
            ("H0H1", Some("Q")),
            ("H0H2", Some("W")),
            ("H0H3", Some("E")),
            ("H0H4", Some("R")),
            ("H0B0", Some("Q")),
        ]
    );
    let champion = &race.heroes[4];
    assert_eq!(champion.full_name, "Aldric");
    let items: Vec<_> = champion
        .items
        .as_ref()
        .unwrap()
        .iter()
        .map(|item| (item.id.as_str(), item.level))
        .collect();
    assert_eq!(items, vec![("I001", Some(5)), ("I002", Some(10))]);

    assert_eq!(race.bonuses.len(), 1);
    let bonus = &race.bonuses[0];
    assert_eq!(bonus.name, "Bonus One");
    assert_eq!(bonus.hotkey.as_deref(), Some("Q"));
    assert_eq!(bonus.units.as_ref().unwrap()[0].id, "u0B0");
    assert_eq!(bonus.spells.as_ref().map(Vec::len), Some(2));
    assert_eq!(bonus.upgrades.as_ref().unwrap()[0].id, "Rbn1");
    assert_eq!(race.bonus_buildings.len(), 1);
    assert_eq!(race.bonus_buildings[0].id, bonus.building_id);

    // Ultimates
    let ultimates = &extraction.ultimates.data;
    assert_eq!(ultimates.pickers.len(), 2);
    assert_eq!(ultimates.pickers[0].name, "Power Ulti");
    assert_eq!(ultimates.pickers[0].requires["Rup9"], 2.0);
    assert_eq!(ultimates.requires["Rup9"], "Power");
    let spell_ids = |picker: &str| -> Vec<String> {
        ultimates.spells[picker].iter().map(|s| s.id.clone()).collect()
    };
    assert_eq!(spell_ids("U000"), vec!["Asp0", "Asp2"]);
    assert_eq!(spell_ids("U001"), vec!["Asp1"]);

    // Artifacts: only the recipe parts this map defines survive
    let artifacts = &extraction.artifacts.data;
    assert_eq!(artifacts.combine_map.len(), 29);
    assert_eq!(artifacts.items.len(), 1);
    assert_eq!(artifacts.items[0].id, "I00E");
    assert_eq!(artifacts.items[0].level, Some(2));

    // Misc
    let misc = &extraction.misc.data;
    assert_eq!(misc.neutrals.len(), 1);
    assert_eq!(misc.neutrals[0].name, "Golem");
    assert_eq!(misc.neutrals[0].skills[0].name, "Slam");
    assert_eq!(
        misc.neutrals[0].skills[0].description.as_deref(),
        Some("Hits<hr/>Hits harder")
    );
    let shrines: Vec<_> = misc.shrines.as_ref().unwrap().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(shrines, vec!["Ash1", "Ash2"]);
    assert_eq!(misc.damage, DamageTable::default());
    let bounty = &misc.bounty["Arc1"];
    assert_eq!(bounty.barracks.len(), 1);
    assert!(bounty.melee.is_some());
}

#[test]
fn test_race_document_json() {
    let dir = map_dir();
    let options = ExtractOptions::new(MapVariant::Oz);
    let catalog = load_catalog(dir.path(), &options);
    let script = ScriptText::load(&dir.path().join("war3map.j")).unwrap();
    let miner = miner_for(MapVariant::Oz, &script, &catalog).unwrap();
    let extraction = Assembler::new(&catalog, miner, DamageTable::default())
        .run()
        .unwrap();

    let doc = serde_json::to_value(&extraction.race_files[0]).unwrap();
    assert_eq!(doc["data"]["key"], "blood_elves");
    assert_eq!(doc["data"]["baseUpgrades"]["melee"]["type"], "upgrade");
    assert_eq!(doc["data"]["t1spell"]["id"], "At01");
    assert!(doc["icons"].is_object());
}

#[test]
fn test_missing_race_block_fails() {
    let dir = map_dir();
    let options = ExtractOptions::new(MapVariant::Oz);
    let catalog = load_catalog(dir.path(), &options);
    let script = ScriptText::new("function Main takes nothing returns nothing\nendfunction\n");
    let miner = miner_for(MapVariant::Oz, &script, &catalog).unwrap();

    let err = Assembler::new(&catalog, miner, DamageTable::default())
        .run()
        .unwrap_err();
    assert!(matches!(err, scmap::Error::MissingLinkage { ref id, .. } if id == "Arc1"));
}

#[test]
fn test_missing_base_table_fails() {
    let dir = TempDir::new().unwrap();
    let store = RawTableStore::new(DirectorySource::new(dir.path()), Arc::new(TextFormatter::default()));
    let err = Catalog::load(&store, Baseline::default(), PatchTable::new()).unwrap_err();
    assert!(err.to_string().contains("war3map.w3u.json"));
}

const OG_SCRIPT: &str = r#"function InitCustomTriggers2 takes nothing returns nothing
call SetTimeOfDay(12.)
set FI[3]='h0F0'
set O2Q[3]='n0BP'
endfunction
function CreateShops takes nothing returns nothing
set udg_Shop1=CreateUnit(Player(PLAYER_NEUTRAL_PASSIVE),'nfh1',0.,0.,270.)
call AddUnitToStockBJ('R001',udg_Shop1,1,1)
call AddUnitToStockBJ('R002',udg_Shop1,1,1)
endfunction
function Trig_Buy_Conditions takes nothing returns boolean
return(GetUnitTypeId(GetSoldUnit())=='R001')
endfunction
function Trig_Buy_Actions takes nothing returns nothing
if(Trig_Buy_Conditions())then
set udg_tmp=3
set udg_Fort[1]=ReplaceUnitBJ(GetTriggerUnit(),FI[udg_tmp],bj_UNIT_STATE_METHOD_DEFAULTS)
endif
endfunction
function Trig_IsCastle takes nothing returns boolean
return(GetUnitTypeId(udg_Fort[1])=='h0F0')
endfunction
function Trig_SetupRace_Actions takes nothing returns nothing
if(Trig_IsCastle())then
set OQ[30]="High Elves"
set I0Q[1]='Aur0'
set I0Q[5]='U0R0'
set I2Q[$D]='Rup1'
set I2Q[1]='Rup2'
set I2Q[17]='Rup3'
set I2Q[9]='Rup4'
set I2Q[5]='Rmg0'
set I2Q[21]='Rtw1'
set I2Q[25]='Rtw2'
set I2Q[29]='Rtw3'
set I2Q[33]='Rtw4'
set I2Q[37]='Rtw5'
set I2Q[41]='Rtw6'
set I2Q[45]='Rtw7'
set I2Q[49]='Rtw8'
set I2Q[53]='Rtw9'
set I1[1]='h0T0'
set Q1[1]='h0B0'
set QO[1]='u0M0'
set OO[1]='u0R0'
set IO[1]='u0G0'
set QI[1]='u0S0'
set Q6[1]='u0A0'
set O6[1]='u0C0'
set Q2[1]='H0H1'
set O2[1]='H0H2'
set I2[1]='H0H3'
set Q3[1]='H0H4'
set OQ[30]="Overwritten"
set OQ[38]="HEL"
endif
endfunction
function Trig_BonusA_Conditions takes nothing returns boolean
return(GetUnitTypeId(GetTriggerUnit())=='n0B1')
endfunction
function Trig_BonusA_Actions takes nothing returns nothing
if(Trig_BonusA_Conditions())then
set Q3[1]='H0B0'
endif
endfunction
function Trig_BonusB_Conditions takes nothing returns boolean
return(GetUnitTypeId(GetTriggerUnit())=='n0B2')
endfunction
function Trig_BonusB_Actions takes nothing returns nothing
if(Trig_BonusB_Conditions())then
set QO[1]='u0B0'
set I2Q[61]='Rbn1'
call SetPlayerTechResearchedSwap('Rbn1',2,GetTriggerPlayer())
endif
endfunction
function Trig_Melee_Conditions takes nothing returns boolean
return(GetUnitTypeId(GetEnteringUnit())=='u0M0')
endfunction
function Trig_Melee_Actions takes nothing returns nothing
if(Trig_Melee_Conditions()and(GetPlayerTechCountSimple('Rmel',GetOwningPlayer(GetEnteringUnit()))>0))then
call DoNothing()
endif
endfunction
function Trig_RaceUlt_Conditions takes nothing returns boolean
return(GetSpellAbilityId()=='U0R0')
endfunction
function Trig_RaceUlt_Actions takes nothing returns nothing
if(Trig_RaceUlt_Conditions())then
set UTg[1]=GetSpellTargetUnit()
endif
endfunction
function Trig_UltHit_Conditions takes nothing returns boolean
return(UTg[1]==GetTriggerUnit())
endfunction
function Trig_UltHit_Actions takes nothing returns nothing
if(Trig_UltHit_Conditions())then
call DoNothing()
call UnitAddAbilityBJ('A0DM',GetTriggerUnit())
endif
endfunction
function Trig_U0_Conditions takes nothing returns boolean
return(GetSpellAbilityId()=='U000')
endfunction
function Trig_U0_Actions takes nothing returns nothing
if(Trig_U0_Conditions())then
call UnitAddAbilityBJ('Asp0',GetTriggerUnit())
call BlzUnitHideAbility(GetTriggerUnit(),'Asp1',true)
endif
endfunction
function Trig_Combine_Actions takes nothing returns nothing
call AddSpecialEffectTargetUnitBJ("origin",GetTriggerUnit(),"combine.mdl")
call RemoveItem(GetItemOfTypeFromUnitBJ(GetTriggerUnit(),'I001'))
call RemoveItem(GetItemOfTypeFromUnitBJ(GetTriggerUnit(),'I002'))
call UnitAddItemByIdSwapped('I00E',GetTriggerUnit())
endfunction
function Trig_HeroLvl_Conditions takes nothing returns boolean
return(GetUnitTypeId(GetTriggerUnit())=='H0B0')
endfunction
function Trig_Lvl5 takes nothing returns boolean
return(GetHeroLevel(GetTriggerUnit())>=5)
endfunction
function Trig_Lvl10 takes nothing returns boolean
return(GetHeroLevel(GetTriggerUnit())>=$A)
endfunction
function Trig_HeroLvl_Actions takes nothing returns nothing
if(Trig_HeroLvl_Conditions())then
call SelectHeroSkill(GetTriggerUnit(),'AHbz')
if(Trig_Lvl5())then
call UnitAddItemByIdSwapped('I001',GetTriggerUnit())
endif
if(Trig_Lvl10())then
call UnitAddItemByIdSwapped('I002',GetTriggerUnit())
endif
endif
endfunction
function SpawnNeutrals takes nothing returns nothing
local player p=Player(PLAYER_NEUTRAL_AGGRESSIVE)
set udg_Neut=CreateUnit(p,'n0N0',0.,0.,270.)
call SetUnitColor(udg_Neut,ConvertPlayerColor(8))
set udg_Neut=CreateUnit(p,'nmoo',0.,0.,270.)
call SetUnitColor(udg_Neut,ConvertPlayerColor(8))
endfunction
"#;

fn write_og_tables(dir: &Path) {
    write_table(
        dir,
        "w3u",
        json!({
            "nfh1": [ field("unam", 0, "Alliance of Light") ],
            "R001": [
                field("unam", 0, "High Elves"),
                field("uhot", 0, "Q"),
                field("utub", 0, "Elves of the high forest")
            ],
            "R002": [ field("unam", 0, "Unfinished Race") ],
            "h0F0": [ field("unam", 0, "Castle"), field("uabi", 0, "At01,At02") ],
            "h0B0": [ field("unam", 0, "Barracks") ],
            "h0T0": [ field("unam", 0, "Guard Tower") ],
            "n0BP": [ field("unam", 0, "Bonus Picker"), field("uupt", 0, "n0B1,n0B2,n00W") ],
            "n0B1": [ field("unam", 0, "Hall of Heroes"), field("utip", 0, "Champion"), field("uhot", 0, "Q") ],
            "n0B2": [ field("unam", 0, "Hall of Arms"), field("utip", 0, "Knights"), field("uhot", 0, "W") ],
            "u0B0": [ field("unam", 0, "Knight") ],
            "H0B0": [ field("unam", 0, "Champion") ],
            "N00T": [ field("unam", 0, "Wanderer") ],
            "H0H1": [ field("unam", 0, "Hero One") ],
            "H0H2": [ field("unam", 0, "Hero Two") ],
            "H0H3": [ field("unam", 0, "Hero Three") ],
            "H0H4": [ field("unam", 0, "Hero Four") ],
            "u0M0": [ field("unam", 0, "Swordsman") ],
            "u0R0": [ field("unam", 0, "Archer") ],
            "u0G0": [ field("unam", 0, "Priest") ],
            "u0S0": [ field("unam", 0, "Ram") ],
            "u0A0": [ field("unam", 0, "Hawk") ],
            "u0C0": [ field("unam", 0, "Catapult") ],
            "n0N0": [ field("unam", 0, "Golem") ],
            "nmoo": [ field("unam", 0, "Moon Well") ]
        }),
    );

    write_table(
        dir,
        "w3a",
        json!({
            "Aur0": [ field("apb1", 1, "Aur1,Aur2") ],
            "Aur1": [ field("atp1", 1, "Aura of Light") ],
            "Aur2": [ field("atp1", 1, "Aura of Might") ],
            "At01": [ field("atp1", 1, "Flame Strike"), field("ahky", 0, "Z") ],
            "At02": [ field("atp1", 1, "Phoenix"), field("ahky", 0, "X") ],
            "U0R0": [ field("atp1", 1, "Starfall") ],
            "A0DM": [ field("aord", 0, "thunderbolt"), field("adur", 1, 2.5) ],
            "A0OA": [ field("apb1", 1, "U000,U001") ],
            "U000": [ field("atp1", 1, "Power Ulti"), field("areq", 0, "Rup9"), field("arqa", 0, "2") ],
            "U001": [ field("atp1", 1, "Storm Ulti") ],
            "Asp0": [ field("atp1", 1, "Meteor") ],
            "Asp1": [ field("atp1", 1, "Big Meteor") ]
        }),
    );

    let mut upgrades = serde_json::Map::new();
    for (id, name) in [
        ("Rup1", "Swords"),
        ("Rup2", "Plating"),
        ("Rup3", "Arrows"),
        ("Rup4", "Walls"),
        ("Rmg0", "Magic"),
        ("Rbn1", "Bonus Research"),
        ("Rmel", "Drills"),
    ] {
        upgrades.insert(id.to_string(), json!([field("gnam", 0, name)]));
    }
    for n in 1..=9 {
        upgrades.insert(
            format!("Rtw{n}"),
            json!([field("gnam", 0, format!("Tower {n}")), field("glvl", 0, 2)]),
        );
    }
    upgrades.insert("Rup9".to_string(), json!([field("gnam", 1, "Power (Tier 2) lv2")]));
    write_table(dir, "w3q", JsonValue::Object(upgrades));

    write_table(
        dir,
        "w3t",
        json!({
            "I000": [ field("inam", 0, "Cloak") ],
            "I001": [ field("inam", 0, "Sword") ],
            "I002": [ field("inam", 0, "Shield") ],
            "I00E": [ field("inam", 0, "Orb"), field("ilev", 0, 2) ]
        }),
    );
}

fn og_map_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_og_tables(dir.path());
    std::fs::write(dir.path().join("war3map.j"), OG_SCRIPT).unwrap();
    dir
}

#[test]
fn test_og_extraction() {
    let dir = og_map_dir();
    let options = ExtractOptions::new(MapVariant::Og);
    let catalog = load_catalog(dir.path(), &options);
    let script = ScriptText::load(&dir.path().join("war3map.j")).unwrap();
    let miner = miner_for(MapVariant::Og, &script, &catalog).unwrap();
    let extraction = Assembler::new(&catalog, miner, DamageTable::default())
        .run()
        .unwrap();

    // Raw mining: every alliance is listed, races without a setup trigger are dropped
    let raw = &extraction.raw;
    assert_eq!(raw.pickers.len(), 4);
    assert_eq!(raw.pickers["nfh1"], vec!["R001", "R002"]);
    assert!(raw.pickers["ngnh"].is_empty());
    assert_eq!(raw.races.len(), 1);
    let raw_race = raw.race("R001").unwrap();
    assert_eq!(raw_race.name, "High Elves");
    assert_eq!(raw_race.key, "hel");
    assert_eq!(raw_race.buildings.fort, "h0F0");
    assert_eq!(raw_race.bonuses, vec!["n0B1", "n0B2", "n00W"]);
    assert_eq!(raw_race.upgrades.len(), 9);
    assert_eq!(raw_race.upgrades[8], "Rtw9");
    assert_eq!(raw_race.bonus_upgrades["n0B2"], vec![("Rbn1".to_string(), 2)]);
    let bonus_heroes: Vec<_> = raw_race
        .bonus_heroes
        .iter()
        .map(|hero| (hero.slot, hero.id.as_str()))
        .collect();
    assert_eq!(bonus_heroes, vec![(3, "H0B0"), (4, "N00T")]);

    // Race index
    let alliance = &extraction.races.data["Alliance of Light"];
    assert_eq!(alliance.len(), 1);
    assert_eq!(alliance[0].id, "R001");
    assert_eq!(alliance[0].hotkey.as_deref(), Some("Q"));
    assert_eq!(alliance[0].description, "Elves of the high forest");

    // Race document
    assert_eq!(extraction.race_files.len(), 1);
    let race = &extraction.race_files[0].data;
    assert_eq!(race.name, "High Elves");
    assert_eq!(race.buildings.fort.name, "Castle");
    assert_eq!(race.buildings.tower.name, "Guard Tower");
    assert_eq!(race.buildings.barrack.name, "Barracks");
    assert_eq!(race.t1spell.id, "At01");
    assert_eq!(race.t2spell.id, "At02");
    assert_eq!(race.base_upgrades.melee.id, "Rup1");
    assert_eq!(race.base_upgrades.range.id, "Rup3");
    assert_eq!(race.tower_upgrades.len(), 9);
    assert_eq!(race.units.mage.name, "Priest");
    assert_eq!(race.units.melee.upgrades, vec!["Rmel"]);

    let auras: Vec<_> = race.auras.iter().map(|a| (a.id.as_str(), a.hotkey.as_deref())).collect();
    assert_eq!(auras, vec![("Aur1", Some("Q")), ("Aur2", Some("W"))]);

    let heroes: Vec<_> = race
        .heroes
        .iter()
        .map(|h| (h.unit.id.as_str(), h.unit.hotkey.as_deref()))
        .collect();
    assert_eq!(
        heroes,
        vec![
            ("H0H1", Some("Q")),
            ("H0H2", Some("W")),
            ("H0H3", Some("E")),
            ("H0H4", Some("R")),
            ("H0B0", Some("R")),
            ("N00T", Some("A")),
        ]
    );
    let hero_items = |idx: usize| -> Vec<(String, Option<u32>)> {
        race.heroes[idx]
            .items
            .as_ref()
            .unwrap()
            .iter()
            .map(|item| (item.id.clone(), item.level))
            .collect()
    };
    assert_eq!(
        hero_items(4),
        vec![("I001".to_string(), Some(5)), ("I002".to_string(), Some(10))]
    );
    assert_eq!(hero_items(5), vec![("I000".to_string(), Some(2))]);

    // Bonus buildings: the hero hall adds no unit, the arms hall a knight
    let bonuses: Vec<_> = race.bonuses.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(bonuses, vec!["n0B1", "n0B2"]);
    assert!(race.bonuses[0].units.is_none());
    assert_eq!(race.bonuses[1].name, "Knights");
    assert_eq!(race.bonuses[1].units.as_ref().unwrap()[0].id, "u0B0");

    // Race ultimate
    let ulti = race.ulti_data.as_ref().unwrap();
    assert_eq!(ulti.id, "U0R0");
    assert_eq!(ulti.name, "Starfall");
    assert_eq!(ulti.hotkey.as_deref(), Some("V"));
    assert_eq!(ulti.steal_interrupt, Some(true));
    assert_eq!(ulti.damage_time.as_ref().and_then(Value::to_f64), Some(2.5));
    assert_eq!(ulti.fake_steal_interrupt, None);

    // Ultimate pickers
    let ultimates = &extraction.ultimates.data;
    let pickers: Vec<_> = ultimates.pickers.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(pickers, vec!["U000", "U001"]);
    assert_eq!(ultimates.requires["Rup9"], "Power");
    let spells: Vec<_> = ultimates.spells["U000"].iter().map(|s| s.id.as_str()).collect();
    assert_eq!(spells, vec!["Asp0", "Asp1"]);
    assert!(!ultimates.spells.contains_key("U001"));

    // Artifacts come from the combine trigger only
    let artifacts = &extraction.artifacts.data;
    assert_eq!(artifacts.combine_map.len(), 1);
    assert_eq!(
        artifacts.combine_map["I00E"],
        vec![vec!["I001".to_string(), "I002".to_string()]]
    );
    let items: Vec<_> = artifacts.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(items, vec!["I00E", "I001", "I002"]);

    // Misc: the moon well is spawned but never listed
    let misc = &extraction.misc.data;
    let neutrals: Vec<_> = misc.neutrals.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(neutrals, vec!["n0N0"]);
    assert!(misc.shrines.is_none());
    assert!(misc.bounty.contains_key("R001"));
}

#[test]
fn test_og_miner_lookups() {
    let dir = og_map_dir();
    let options = ExtractOptions::new(MapVariant::Og);
    let catalog = load_catalog(dir.path(), &options);
    let script = ScriptText::new(OG_SCRIPT);
    let miner = miner_for(MapVariant::Og, &script, &catalog).unwrap();

    assert_eq!(miner.bonus_unit("n0B2").unwrap().as_deref(), Some("u0B0"));
    assert_eq!(miner.bonus_unit("n0B1").unwrap(), None);

    let mined = miner.hero_items("H0B0").unwrap().unwrap();
    assert_eq!(mined.get("I001"), Some(&5));
    assert_eq!(mined.get("I002"), Some(&10));

    let fixed = miner.hero_items("H04G").unwrap().unwrap();
    let fixed: Vec<_> = fixed.iter().map(|(id, level)| (id.as_str(), *level)).collect();
    assert_eq!(fixed, vec![("I005", 4), ("I006", 8), ("I007", 14), ("I008", 20)]);
    assert!(miner.hero_items("H0H1").unwrap().is_none());

    let units = catalog.units();
    let melee = units.unit_object(&units.get("u0M0").unwrap()).unwrap();
    assert_eq!(miner.enrich_unit_requires(melee).unwrap().upgrades, vec!["Rmel"]);
    let archer = units.unit_object(&units.get("u0R0").unwrap()).unwrap();
    assert!(miner.enrich_unit_requires(archer).unwrap().upgrades.is_empty());
}

#[test]
fn test_og_race_without_fort_swap_is_skipped() {
    let dir = og_map_dir();
    let options = ExtractOptions::new(MapVariant::Og);
    let catalog = load_catalog(dir.path(), &options);
    let script = ScriptText::new(&OG_SCRIPT.replace("set udg_tmp=3\n", ""));
    let miner = miner_for(MapVariant::Og, &script, &catalog).unwrap();

    let raw = miner.patch_data().unwrap();
    assert_eq!(raw.pickers["nfh1"], vec!["R001", "R002"]);
    assert!(raw.races.is_empty());
}
