//! Compiled-in table of common tag pairs, addressed by index.
//!
//! Order is part of the wire format: producers encode these indices directly.

pub(crate) const STATIC_TAG_PAIRS: &[(&str, &str)] = &[
    ("highway", "motorway"),
    ("highway", "motorway_link"),
    ("highway", "trunk"),
    ("highway", "trunk_link"),
    ("highway", "primary"),
    ("highway", "primary_link"),
    ("highway", "secondary"),
    ("highway", "secondary_link"),
    ("highway", "tertiary"),
    ("highway", "tertiary_link"),
    ("highway", "unclassified"),
    ("highway", "residential"),
    ("highway", "living_street"),
    ("highway", "service"),
    ("highway", "pedestrian"),
    ("highway", "track"),
    ("highway", "bus_guideway"),
    ("highway", "raceway"),
    ("highway", "road"),
    ("highway", "footway"),
    ("highway", "cycleway"),
    ("highway", "bridleway"),
    ("highway", "steps"),
    ("highway", "path"),
    ("highway", "construction"),
    ("highway", "proposed"),
    ("highway", "platform"),
    ("highway", "turning_circle"),
    ("highway", "traffic_signals"),
    ("highway", "crossing"),
    ("highway", "bus_stop"),
    ("highway", "stop"),
    ("highway", "give_way"),
    ("highway", "mini_roundabout"),
    ("highway", "motorway_junction"),
    ("highway", "street_lamp"),
    ("highway", "speed_camera"),
    ("highway", "elevator"),
    ("building", "yes"),
    ("building", "house"),
    ("building", "residential"),
    ("building", "apartments"),
    ("building", "garage"),
    ("building", "garages"),
    ("building", "commercial"),
    ("building", "industrial"),
    ("building", "retail"),
    ("building", "church"),
    ("building", "school"),
    ("building", "roof"),
    ("building", "hut"),
    ("building", "shed"),
    ("building", "detached"),
    ("building", "terrace"),
    ("building", "university"),
    ("building", "hospital"),
    ("building", "warehouse"),
    ("building", "train_station"),
    ("landuse", "residential"),
    ("landuse", "commercial"),
    ("landuse", "industrial"),
    ("landuse", "retail"),
    ("landuse", "farmland"),
    ("landuse", "farmyard"),
    ("landuse", "forest"),
    ("landuse", "meadow"),
    ("landuse", "grass"),
    ("landuse", "orchard"),
    ("landuse", "vineyard"),
    ("landuse", "cemetery"),
    ("landuse", "allotments"),
    ("landuse", "quarry"),
    ("landuse", "construction"),
    ("landuse", "brownfield"),
    ("landuse", "greenfield"),
    ("landuse", "railway"),
    ("landuse", "reservoir"),
    ("landuse", "basin"),
    ("landuse", "military"),
    ("landuse", "recreation_ground"),
    ("landuse", "village_green"),
    ("landuse", "landfill"),
    ("landuse", "garages"),
    ("landuse", "plant_nursery"),
    ("natural", "water"),
    ("natural", "wood"),
    ("natural", "scrub"),
    ("natural", "heath"),
    ("natural", "grassland"),
    ("natural", "wetland"),
    ("natural", "sand"),
    ("natural", "beach"),
    ("natural", "bare_rock"),
    ("natural", "scree"),
    ("natural", "glacier"),
    ("natural", "peak"),
    ("natural", "tree"),
    ("natural", "tree_row"),
    ("natural", "cliff"),
    ("natural", "coastline"),
    ("natural", "spring"),
    ("natural", "cave_entrance"),
    ("natural", "volcano"),
    ("natural", "land"),
    ("natural", "bay"),
    ("natural", "ridge"),
    ("waterway", "river"),
    ("waterway", "stream"),
    ("waterway", "canal"),
    ("waterway", "drain"),
    ("waterway", "ditch"),
    ("waterway", "riverbank"),
    ("waterway", "dam"),
    ("waterway", "weir"),
    ("waterway", "lock_gate"),
    ("waterway", "waterfall"),
    ("waterway", "dock"),
    ("waterway", "boatyard"),
    ("railway", "rail"),
    ("railway", "light_rail"),
    ("railway", "subway"),
    ("railway", "tram"),
    ("railway", "narrow_gauge"),
    ("railway", "monorail"),
    ("railway", "funicular"),
    ("railway", "preserved"),
    ("railway", "disused"),
    ("railway", "abandoned"),
    ("railway", "station"),
    ("railway", "halt"),
    ("railway", "tram_stop"),
    ("railway", "level_crossing"),
    ("railway", "crossing"),
    ("railway", "platform"),
    ("railway", "subway_entrance"),
    ("amenity", "parking"),
    ("amenity", "place_of_worship"),
    ("amenity", "school"),
    ("amenity", "restaurant"),
    ("amenity", "cafe"),
    ("amenity", "fast_food"),
    ("amenity", "bank"),
    ("amenity", "atm"),
    ("amenity", "pharmacy"),
    ("amenity", "hospital"),
    ("amenity", "clinic"),
    ("amenity", "doctors"),
    ("amenity", "dentist"),
    ("amenity", "fuel"),
    ("amenity", "post_office"),
    ("amenity", "post_box"),
    ("amenity", "police"),
    ("amenity", "fire_station"),
    ("amenity", "townhall"),
    ("amenity", "library"),
    ("amenity", "university"),
    ("amenity", "college"),
    ("amenity", "kindergarten"),
    ("amenity", "bicycle_parking"),
    ("amenity", "bench"),
    ("amenity", "toilets"),
    ("amenity", "telephone"),
    ("amenity", "drinking_water"),
    ("amenity", "recycling"),
    ("amenity", "waste_basket"),
    ("amenity", "pub"),
    ("amenity", "bar"),
    ("amenity", "cinema"),
    ("amenity", "theatre"),
    ("amenity", "marketplace"),
    ("amenity", "bus_station"),
    ("amenity", "taxi"),
    ("amenity", "car_rental"),
    ("amenity", "shelter"),
    ("amenity", "fountain"),
    ("amenity", "grave_yard"),
    ("amenity", "embassy"),
    ("amenity", "courthouse"),
    ("amenity", "prison"),
    ("amenity", "community_centre"),
    ("amenity", "nightclub"),
    ("amenity", "ice_cream"),
    ("amenity", "biergarten"),
    ("amenity", "parking_entrance"),
    ("leisure", "park"),
    ("leisure", "pitch"),
    ("leisure", "playground"),
    ("leisure", "garden"),
    ("leisure", "sports_centre"),
    ("leisure", "stadium"),
    ("leisure", "swimming_pool"),
    ("leisure", "golf_course"),
    ("leisure", "nature_reserve"),
    ("leisure", "track"),
    ("leisure", "water_park"),
    ("leisure", "marina"),
    ("leisure", "slipway"),
    ("leisure", "common"),
    ("leisure", "dog_park"),
    ("leisure", "picnic_table"),
    ("leisure", "fitness_centre"),
    ("leisure", "ice_rink"),
    ("shop", "supermarket"),
    ("shop", "convenience"),
    ("shop", "bakery"),
    ("shop", "butcher"),
    ("shop", "clothes"),
    ("shop", "hairdresser"),
    ("shop", "car"),
    ("shop", "car_repair"),
    ("shop", "bicycle"),
    ("shop", "books"),
    ("shop", "kiosk"),
    ("shop", "florist"),
    ("shop", "mall"),
    ("shop", "department_store"),
    ("shop", "doityourself"),
    ("shop", "hardware"),
    ("shop", "optician"),
    ("shop", "shoes"),
    ("shop", "electronics"),
    ("shop", "furniture"),
    ("tourism", "hotel"),
    ("tourism", "motel"),
    ("tourism", "guest_house"),
    ("tourism", "hostel"),
    ("tourism", "camp_site"),
    ("tourism", "caravan_site"),
    ("tourism", "museum"),
    ("tourism", "attraction"),
    ("tourism", "viewpoint"),
    ("tourism", "information"),
    ("tourism", "picnic_site"),
    ("tourism", "zoo"),
    ("tourism", "theme_park"),
    ("tourism", "artwork"),
    ("tourism", "alpine_hut"),
    ("tourism", "chalet"),
    ("place", "continent"),
    ("place", "country"),
    ("place", "state"),
    ("place", "region"),
    ("place", "county"),
    ("place", "city"),
    ("place", "town"),
    ("place", "village"),
    ("place", "hamlet"),
    ("place", "suburb"),
    ("place", "neighbourhood"),
    ("place", "locality"),
    ("place", "island"),
    ("place", "islet"),
    ("place", "isolated_dwelling"),
    ("place", "farm"),
    ("boundary", "administrative"),
    ("boundary", "national_park"),
    ("boundary", "protected_area"),
    ("boundary", "political"),
    ("boundary", "maritime"),
    ("admin_level", "2"),
    ("admin_level", "3"),
    ("admin_level", "4"),
    ("admin_level", "5"),
    ("admin_level", "6"),
    ("admin_level", "7"),
    ("admin_level", "8"),
    ("admin_level", "9"),
    ("admin_level", "10"),
    ("barrier", "fence"),
    ("barrier", "wall"),
    ("barrier", "hedge"),
    ("barrier", "gate"),
    ("barrier", "bollard"),
    ("barrier", "retaining_wall"),
    ("barrier", "city_wall"),
    ("barrier", "kerb"),
    ("barrier", "lift_gate"),
    ("barrier", "cycle_barrier"),
    ("barrier", "block"),
    ("barrier", "ditch"),
    ("man_made", "pier"),
    ("man_made", "breakwater"),
    ("man_made", "groyne"),
    ("man_made", "tower"),
    ("man_made", "water_tower"),
    ("man_made", "lighthouse"),
    ("man_made", "windmill"),
    ("man_made", "chimney"),
    ("man_made", "mast"),
    ("man_made", "works"),
    ("man_made", "wastewater_plant"),
    ("man_made", "pipeline"),
    ("man_made", "embankment"),
    ("man_made", "bridge"),
    ("man_made", "cutline"),
    ("power", "line"),
    ("power", "minor_line"),
    ("power", "tower"),
    ("power", "pole"),
    ("power", "substation"),
    ("power", "generator"),
    ("power", "plant"),
    ("power", "cable"),
    ("aeroway", "aerodrome"),
    ("aeroway", "runway"),
    ("aeroway", "taxiway"),
    ("aeroway", "apron"),
    ("aeroway", "helipad"),
    ("aeroway", "terminal"),
    ("aeroway", "gate"),
    ("aeroway", "hangar"),
    ("aerialway", "cable_car"),
    ("aerialway", "gondola"),
    ("aerialway", "chair_lift"),
    ("aerialway", "drag_lift"),
    ("aerialway", "station"),
    ("aerialway", "goods"),
    ("route", "ferry"),
    ("route", "bus"),
    ("route", "bicycle"),
    ("route", "hiking"),
    ("route", "road"),
    ("route", "train"),
    ("route", "tram"),
    ("route", "ski"),
    ("area", "yes"),
    ("area", "no"),
    ("bridge", "yes"),
    ("bridge", "viaduct"),
    ("tunnel", "yes"),
    ("tunnel", "building_passage"),
    ("tunnel", "culvert"),
    ("oneway", "yes"),
    ("oneway", "no"),
    ("oneway", "-1"),
    ("access", "yes"),
    ("access", "no"),
    ("access", "private"),
    ("access", "permissive"),
    ("access", "destination"),
    ("access", "delivery"),
    ("surface", "paved"),
    ("surface", "unpaved"),
    ("surface", "asphalt"),
    ("surface", "concrete"),
    ("surface", "gravel"),
    ("surface", "dirt"),
    ("surface", "grass"),
    ("surface", "sand"),
    ("surface", "cobblestone"),
    ("surface", "paving_stones"),
    ("surface", "ground"),
    ("surface", "wood"),
    ("sport", "soccer"),
    ("sport", "tennis"),
    ("sport", "swimming"),
    ("sport", "basketball"),
    ("sport", "baseball"),
    ("sport", "golf"),
    ("sport", "multi"),
    ("sport", "equestrian"),
    ("sport", "athletics"),
    ("service", "driveway"),
    ("service", "parking_aisle"),
    ("service", "alley"),
    ("service", "spur"),
    ("service", "siding"),
    ("service", "yard"),
    ("service", "drive-through"),
    ("layer", "-5"),
    ("layer", "-4"),
    ("layer", "-3"),
    ("layer", "-2"),
    ("layer", "-1"),
    ("layer", "1"),
    ("layer", "2"),
    ("layer", "3"),
    ("layer", "4"),
    ("layer", "5"),
    ("wetland", "marsh"),
    ("wetland", "swamp"),
    ("wetland", "bog"),
    ("wetland", "reedbed"),
    ("wetland", "tidalflat"),
    ("wood", "coniferous"),
    ("wood", "deciduous"),
    ("wood", "mixed"),
    ("religion", "christian"),
    ("religion", "muslim"),
    ("religion", "jewish"),
    ("religion", "buddhist"),
    ("religion", "hindu"),
    ("historic", "castle"),
    ("historic", "memorial"),
    ("historic", "monument"),
    ("historic", "ruins"),
    ("historic", "archaeological_site"),
    ("historic", "wayside_cross"),
    ("historic", "wayside_shrine"),
    ("military", "barracks"),
    ("military", "danger_area"),
    ("military", "range"),
    ("military", "airfield"),
    ("piste:type", "downhill"),
    ("piste:type", "nordic"),
    ("piste:type", "sled"),
    ("tracktype", "grade1"),
    ("tracktype", "grade2"),
    ("tracktype", "grade3"),
    ("tracktype", "grade4"),
    ("tracktype", "grade5"),
    ("cycleway", "lane"),
    ("cycleway", "track"),
    ("cycleway", "opposite"),
    ("cycleway", "shared_lane"),
    ("building:part", "yes"),
    ("roof:shape", "flat"),
    ("roof:shape", "gabled"),
    ("roof:shape", "hipped"),
    ("roof:shape", "pyramidal"),
    ("roof:shape", "dome"),
    ("roof:shape", "skillion"),
];
